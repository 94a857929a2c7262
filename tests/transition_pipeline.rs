//! End-to-end tests of the transition pipeline.
//!
//! Each test builds a small state tree, registers recording hooks and runs
//! real transitions through a `TransitionService`.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;
use waypoint::core::{ParamDeclaration, State, StateParams};
use waypoint::hooks::{HookCallback, HookEvent, HookOptions, HookResult, MatchCriteria};
use waypoint::registry::{StateBuilder, StateRegistry, TargetState};
use waypoint::resolve::ResolveDeclaration;
use waypoint::transition::{
    RejectionKind, TransitionError, TransitionOptions, TransitionService,
};

type Log = Arc<Mutex<Vec<String>>>;

fn record(log: &Log, entry: &str) -> HookCallback {
    let log = Arc::clone(log);
    let entry = entry.to_string();
    let label = entry.clone();
    HookCallback::from_fn(move |_| {
        log.lock().push(entry.clone());
        Ok(HookResult::Continue)
    })
    .named(label)
}

struct Fixture {
    service: TransitionService,
    log: Log,
}

impl Fixture {
    /// root -> parent -> {a, b}; root -> user(id, tab dynamic) -> detail; admin
    fn new() -> Self {
        let log: Log = Arc::default();
        let registry = StateRegistry::new();
        let state = |name: &str| {
            StateBuilder::new(name)
                .on_enter(record(&log, &format!("enter {name}")))
                .on_exit(record(&log, &format!("exit {name}")))
        };
        let declarations = vec![
            state("root").build().unwrap(),
            state("root.parent").build().unwrap(),
            state("root.parent.a").build().unwrap(),
            state("root.parent.b").build().unwrap(),
            state("root.user")
                .param("id")
                .declare_param(ParamDeclaration::new("tab").dynamic())
                .build()
                .unwrap(),
            state("root.user.detail").build().unwrap(),
            state("admin").build().unwrap(),
        ];
        registry.register_all(declarations).unwrap();

        Self {
            service: TransitionService::new(registry),
            log,
        }
    }

    fn target(&self, name: &str, params: StateParams) -> TargetState {
        self.service.target(name, params)
    }

    fn at(&self, name: &str) -> TargetState {
        self.target(name, StateParams::new())
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    fn clear(&self) {
        self.log.lock().clear();
    }

    /// Record every event for every transition.
    fn record_all_events(&self) {
        for event in HookEvent::ALL {
            self.service.hooks().register(
                event,
                MatchCriteria::any(),
                record(&self.log, &event.to_string()),
                None,
            );
        }
    }
}

fn names(states: &[Arc<State>]) -> Vec<&str> {
    states.iter().map(|s| s.name()).collect()
}

fn kind(err: &TransitionError) -> Option<RejectionKind> {
    err.rejection_kind()
}

#[tokio::test]
async fn siblings_retain_common_ancestors() {
    let fx = Fixture::new();
    let t = fx.service.create(
        fx.at("root.parent.a"),
        fx.at("root.parent.b"),
        TransitionOptions::default(),
    );

    assert_eq!(names(&t.retained()), vec!["root", "root.parent"]);
    assert_eq!(names(&t.exiting()), vec!["root.parent.a"]);
    assert_eq!(names(&t.entering()), vec!["root.parent.b"]);

    let entered = t.run().await.unwrap();
    assert_eq!(entered.name(), "root.parent.b");
    assert_eq!(fx.log(), vec!["exit root.parent.a", "enter root.parent.b"]);
}

#[tokio::test]
async fn diff_accessors_are_stable() {
    let fx = Fixture::new();
    let t = fx.service.create(
        fx.at("root.parent.a"),
        fx.at("root.user.detail"),
        TransitionOptions::default(),
    );

    let first = (t.retained(), t.exiting(), t.entering());
    let second = (t.retained(), t.exiting(), t.entering());
    assert_eq!(names(&first.0), names(&second.0));
    assert_eq!(names(&first.1), names(&second.1));
    assert_eq!(names(&first.2), names(&second.2));
    assert!(std::ptr::eq(t.tree_changes(), t.tree_changes()));
}

#[tokio::test]
async fn states_exit_leaf_first_and_enter_root_first() {
    let fx = Fixture::new();
    fx.service
        .hooks()
        .exiting(MatchCriteria::any(), record(&fx.log, "exiting"), None);
    fx.service
        .hooks()
        .entering(MatchCriteria::any(), record(&fx.log, "entering"), None);

    fx.service
        .transition_to(
            fx.at("root.parent.a"),
            fx.at("root.user.detail"),
            TransitionOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(
        fx.log(),
        vec![
            "exiting",
            "exit root.parent.a",
            "exiting",
            "exit root.parent",
            "entering",
            "enter root.user",
            "entering",
            "enter root.user.detail",
        ]
    );
}

#[tokio::test]
async fn same_target_is_ignored_without_hooks() {
    let fx = Fixture::new();
    fx.record_all_events();
    let params = StateParams::new().with("id", 1);
    let t = fx.service.create(
        fx.target("root.user", params.clone()),
        fx.target("root.user", params),
        TransitionOptions::default(),
    );

    assert!(t.ignored());
    let err = t.run().await.unwrap_err();
    assert_eq!(kind(&err), Some(RejectionKind::Ignored));
    assert!(fx.log().is_empty());

    assert_eq!(kind(&t.promise().await.unwrap_err()), Some(RejectionKind::Ignored));
    assert_eq!(kind(&t.prepromise().await.unwrap_err()), Some(RejectionKind::Ignored));
    assert_eq!(kind(&t.redirects().await.unwrap_err()), Some(RejectionKind::Ignored));
    assert!(fx.service.current().is_none());
}

#[tokio::test]
async fn ignored_transition_supersedes_the_one_in_flight() {
    let fx = Fixture::new();
    let reached = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    {
        let reached = Arc::clone(&reached);
        let release = Arc::clone(&release);
        fx.service.hooks().on_start(
            MatchCriteria::to("root.parent.b"),
            HookCallback::from_future(move |_| {
                let reached = Arc::clone(&reached);
                let release = Arc::clone(&release);
                async move {
                    reached.notify_one();
                    release.notified().await;
                    Ok(HookResult::Continue)
                }
            }),
            None,
        );
    }

    let t1 = fx.service.create(fx.at("root.parent.a"), fx.at("root.parent.b"), Default::default());
    let second = async {
        reached.notified().await;
        let params = StateParams::new().with("id", 1);
        let t2 = fx.service.create(
            fx.target("root.user", params.clone()),
            fx.target("root.user", params),
            Default::default(),
        );
        let outcome = t2.run().await;
        assert!(fx.service.current().is_none());
        release.notify_one();
        outcome
    };

    let (first, second) = tokio::join!(t1.run(), second);

    assert_eq!(kind(&second.unwrap_err()), Some(RejectionKind::Ignored));
    let err = first.unwrap_err();
    let rejection = err.rejection().unwrap();
    assert_eq!(rejection.kind(), RejectionKind::Superseded);
    assert!(rejection.transition().is_none());
    assert!(!fx.log().contains(&"enter root.parent.b".to_string()));
}

#[tokio::test]
async fn reload_reenters_the_same_state() {
    let fx = Fixture::new();
    let params = StateParams::new().with("id", 1);
    let t = fx.service.create(
        fx.target("root.user", params.clone()),
        fx.target("root.user", params),
        TransitionOptions::default().reload(),
    );

    assert!(!t.ignored());
    assert!(names(&t.exiting()).contains(&"root.user"));
    assert!(names(&t.entering()).contains(&"root.user"));

    t.run().await.unwrap();
    assert_eq!(
        fx.log(),
        vec!["exit root.user", "exit root", "enter root", "enter root.user"]
    );
}

#[tokio::test]
async fn dynamic_param_change_keeps_owner() {
    let fx = Fixture::new();
    let t = fx.service.create(
        fx.target("root.user", StateParams::new().with("id", 1).with("tab", "info")),
        fx.target(
            "root.user.detail",
            StateParams::new().with("id", 1).with("tab", "posts"),
        ),
        TransitionOptions::default(),
    );

    assert_eq!(names(&t.retained()), vec!["root", "root.user"]);
    assert!(t.exiting().is_empty());
    assert_eq!(names(&t.entering()), vec!["root.user.detail"]);
}

#[tokio::test]
async fn changed_param_reenters_owner() {
    let fx = Fixture::new();
    let t = fx.service.create(
        fx.target("root.user.detail", StateParams::new().with("id", 1)),
        fx.target("root.user.detail", StateParams::new().with("id", 2)),
        TransitionOptions::default(),
    );

    assert_eq!(names(&t.retained()), vec!["root"]);
    assert_eq!(names(&t.exiting()), vec!["root.user.detail", "root.user"]);
}

#[tokio::test]
async fn hooks_run_by_ascending_priority() {
    let fx = Fixture::new();
    let hooks = fx.service.hooks();
    hooks.on(MatchCriteria::any(), record(&fx.log, "five"), HookOptions::priority(5));
    hooks.on(MatchCriteria::any(), record(&fx.log, "one"), HookOptions::priority(1));
    hooks.on(MatchCriteria::any(), record(&fx.log, "three"), HookOptions::priority(3));

    fx.service
        .transition_to(fx.at("root.parent.a"), fx.at("root.parent.b"), Default::default())
        .await
        .unwrap();

    let log = fx.log();
    assert_eq!(&log[..3], ["one", "three", "five"]);
}

#[tokio::test]
async fn phases_run_in_pipeline_order() {
    let fx = Fixture::new();
    fx.record_all_events();

    fx.service
        .transition_to(fx.at("root.parent.a"), fx.at("root.parent.b"), Default::default())
        .await
        .unwrap();

    assert_eq!(
        fx.log(),
        vec![
            "onBefore",
            "onStart",
            "on",
            "exiting",
            "exit root.parent.a",
            "entering",
            "enter root.parent.b",
            "onSuccess",
        ]
    );
}

#[tokio::test]
async fn false_from_hook_aborts_before_any_state_changes() {
    let fx = Fixture::new();
    fx.service.hooks().on(
        MatchCriteria::to("root.parent.*"),
        HookCallback::from_fn(|_| Ok(false.into())),
        None,
    );
    let errors: Log = Arc::default();
    let seen = Arc::clone(&errors);
    fx.service.hooks().on_error(
        MatchCriteria::any(),
        HookCallback::from_fn(move |ctx| {
            let kind = ctx.error().and_then(|e| e.rejection_kind());
            seen.lock().push(format!("{kind:?}"));
            Ok(HookResult::Continue)
        }),
        None,
    );

    let t = fx.service.create(fx.at("root.parent.a"), fx.at("root.parent.b"), Default::default());
    let err = t.run().await.unwrap_err();

    assert_eq!(kind(&err), Some(RejectionKind::Aborted));
    assert!(fx.log().is_empty());
    assert_eq!(errors.lock().clone(), vec!["Some(Aborted)"]);
    assert_eq!(kind(&t.promise().await.unwrap_err()), Some(RejectionKind::Aborted));
}

#[tokio::test]
async fn resolvables_added_by_a_hook_are_injectable_later() {
    let fx = Fixture::new();
    fx.service.hooks().on_start(
        MatchCriteria::any(),
        HookCallback::from_fn(|_| Ok(vec![ResolveDeclaration::value("extra", 42)].into())),
        None,
    );
    let seen: Log = Arc::default();
    let sink = Arc::clone(&seen);
    fx.service.hooks().entering(
        MatchCriteria::to("root.parent.b"),
        HookCallback::from_fn(move |ctx| {
            let extra: i64 = ctx.get_as("extra")?;
            sink.lock().push(format!("{} saw {extra}", ctx.state().map_or("-", |s| s.name())));
            Ok(HookResult::Continue)
        })
        .with_deps(["extra"]),
        None,
    );

    fx.service
        .transition_to(fx.at("root.parent.a"), fx.at("root.parent.b"), Default::default())
        .await
        .unwrap();

    assert_eq!(seen.lock().clone(), vec!["root.parent.b saw 42"]);
}

#[tokio::test]
async fn state_resolvables_are_ready_before_entering() {
    let registry = StateRegistry::new();
    let seen: Log = Arc::default();
    let sink = Arc::clone(&seen);
    registry
        .register(
            StateBuilder::new("profile")
                .param("id")
                .resolve(ResolveDeclaration::from_fn("user", ["id"], |args| {
                    let id: i64 = args.get_as("id")?;
                    Ok(serde_json::json!({ "id": id, "name": format!("user{id}") }))
                }))
                .resolve(ResolveDeclaration::from_fn("id", Vec::<String>::new(), |args| {
                    Ok(args.params().get("id").cloned().unwrap_or_default())
                }))
                .on_enter(HookCallback::from_fn(move |ctx| {
                    let user: serde_json::Value = ctx.get_as("user")?;
                    sink.lock().push(user["name"].as_str().unwrap_or_default().to_string());
                    Ok(HookResult::Continue)
                }))
                .build()
                .unwrap(),
        )
        .unwrap();
    let service = TransitionService::new(registry);

    service
        .transition_to(
            TargetState::empty(),
            service.target("profile", StateParams::new().with("id", 5)),
            Default::default(),
        )
        .await
        .unwrap();

    assert_eq!(seen.lock().clone(), vec!["user5"]);
}

#[tokio::test]
async fn invalid_target_runs_invalid_hooks_only() {
    let fx = Fixture::new();
    fx.record_all_events();
    let t = fx.service.create(fx.at("root"), fx.at("nowhere"), Default::default());

    assert!(t.entering().is_empty());
    let err = t.run().await.unwrap_err();

    let rejection = err.rejection().unwrap();
    assert_eq!(rejection.kind(), RejectionKind::Invalid);
    assert_eq!(rejection.target(), Some("nowhere"));
    assert_eq!(fx.log(), vec!["onBefore", "onInvalid", "on", "onError"]);
}

#[tokio::test]
async fn newer_transition_supersedes_running_one() {
    let fx = Fixture::new();
    let reached = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    {
        let reached = Arc::clone(&reached);
        let release = Arc::clone(&release);
        fx.service.hooks().on_start(
            MatchCriteria::to("root.parent.a"),
            HookCallback::from_future(move |_| {
                let reached = Arc::clone(&reached);
                let release = Arc::clone(&release);
                async move {
                    reached.notify_one();
                    release.notified().await;
                    Ok(HookResult::Continue)
                }
            }),
            None,
        );
    }

    let t1 = fx.service.create(fx.at("root"), fx.at("root.parent.a"), Default::default());
    let second = async {
        reached.notified().await;
        let t2 = fx.service.create(fx.at("root"), fx.at("root.parent.b"), Default::default());
        let outcome = t2.run().await;
        release.notify_one();
        (t2, outcome)
    };

    let (first, (t2, second)) = tokio::join!(t1.run(), second);

    assert!(second.is_ok());
    let err = first.unwrap_err();
    let rejection = err.rejection().unwrap();
    assert_eq!(rejection.kind(), RejectionKind::Superseded);
    assert!(!rejection.is_redirected());
    assert_eq!(rejection.transition().map(|t| t.id()), Some(t2.id()));

    let posthooks = t1.promise().await.unwrap_err();
    assert_eq!(kind(&posthooks), Some(RejectionKind::Superseded));
    assert!(!fx.log().contains(&"enter root.parent.a".to_string()));
}

#[tokio::test]
async fn redirect_hands_over_to_new_transition() {
    let fx = Fixture::new();
    let detour = fx.at("root.parent.b");
    fx.service.hooks().on_start(
        MatchCriteria::to("admin"),
        HookCallback::from_fn(move |ctx| {
            Ok(HookResult::RedirectTo(ctx.transition().redirect(detour.clone(), None)))
        }),
        None,
    );

    let t1 = fx.service.create(fx.at("root.parent.a"), fx.at("admin"), Default::default());
    let entered = fx.service.follow(t1.clone()).await.unwrap();
    assert_eq!(entered.name(), "root.parent.b");

    let err = t1.promise().await.unwrap_err();
    assert!(err.is_redirect());
    let next = err.rejection().and_then(|r| r.transition()).unwrap();
    assert_eq!(next.previous().map(|p| p.id()), Some(t1.id()));
    assert_eq!(next.redirect_chain().len(), 1);

    let final_state = t1.redirects().await.unwrap();
    assert_eq!(final_state.name(), "root.parent.b");
    assert!(!fx.log().contains(&"enter admin".to_string()));
}

#[tokio::test]
async fn endless_redirects_are_cut_off() {
    let fx = Fixture::new();
    let a = fx.at("root.parent.a");
    let b = fx.at("root.parent.b");
    fx.service.hooks().on_start(
        MatchCriteria::any(),
        HookCallback::from_fn(move |ctx| {
            let next = if ctx.transition().to().name() == "root.parent.a" { &b } else { &a };
            Ok(ctx.transition().redirect(next.clone(), None).into())
        }),
        None,
    );

    let err = fx
        .service
        .transition_to(fx.at("root"), fx.at("root.parent.a"), Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TransitionError::TooManyRedirects { .. }));
}

#[tokio::test]
async fn abort_mid_flight_supersedes_remaining_steps() {
    let fx = Fixture::new();
    fx.service.hooks().on(
        MatchCriteria::any(),
        HookCallback::from_fn(|ctx| {
            ctx.transition().abort();
            Ok(HookResult::Continue)
        }),
        None,
    );

    let err = fx
        .service
        .transition_to(fx.at("root.parent.a"), fx.at("root.parent.b"), Default::default())
        .await
        .unwrap_err();

    let rejection = err.rejection().unwrap();
    assert_eq!(rejection.kind(), RejectionKind::Superseded);
    assert!(rejection.transition().is_none());
    assert!(fx.log().is_empty());
}

#[tokio::test]
async fn success_hook_faults_are_swallowed() {
    let fx = Fixture::new();
    fx.service.hooks().on_success(
        MatchCriteria::any(),
        HookCallback::from_fn(|_| Err(TransitionError::hook("boom"))),
        None,
    );
    fx.service
        .hooks()
        .on_success(MatchCriteria::any(), record(&fx.log, "after boom"), None);

    let t = fx.service.create(fx.at("root.parent.a"), fx.at("root.parent.b"), Default::default());
    let entered = t.run().await.unwrap();

    assert_eq!(entered.name(), "root.parent.b");
    assert_eq!(t.promise().await.unwrap().name(), "root.parent.b");
    assert!(fx.log().contains(&"after boom".to_string()));
}

#[tokio::test]
async fn error_hook_faults_are_swallowed() {
    let fx = Fixture::new();
    fx.service.hooks().on_start(
        MatchCriteria::to("admin"),
        HookCallback::from_fn(|_| Ok(HookResult::Abort)),
        None,
    );
    fx.service.hooks().on_error(
        MatchCriteria::any(),
        HookCallback::from_fn(|_| Err(TransitionError::hook("boom"))),
        None,
    );
    fx.service
        .hooks()
        .on_error(MatchCriteria::any(), record(&fx.log, "after boom"), None);

    let t = fx.service.create(fx.at("root"), fx.at("admin"), Default::default());
    let err = t.run().await.unwrap_err();

    assert_eq!(kind(&err), Some(RejectionKind::Aborted));
    assert_eq!(kind(&t.promise().await.unwrap_err()), Some(RejectionKind::Aborted));
    assert_eq!(fx.log(), vec!["after boom"]);
}

#[tokio::test]
async fn state_hooks_match_the_state_being_entered_or_exited() {
    let fx = Fixture::new();
    fx.service.hooks().entering(
        MatchCriteria::to("root.user"),
        record(&fx.log, "entering root.user"),
        None,
    );
    fx.service.hooks().exiting(
        MatchCriteria::any().with_from("root.user"),
        record(&fx.log, "exiting root.user"),
        None,
    );

    let params = StateParams::new().with("id", 1);
    fx.service
        .create(
            fx.at("root.parent.a"),
            fx.target("root.user.detail", params.clone()),
            Default::default(),
        )
        .run()
        .await
        .unwrap();
    assert_eq!(
        fx.log(),
        vec![
            "exit root.parent.a",
            "exit root.parent",
            "entering root.user",
            "enter root.user",
            "enter root.user.detail",
        ]
    );

    fx.clear();
    fx.service
        .create(fx.target("root.user.detail", params), fx.at("admin"), Default::default())
        .run()
        .await
        .unwrap();
    assert_eq!(
        fx.log(),
        vec![
            "exit root.user.detail",
            "exiting root.user",
            "exit root.user",
            "exit root",
            "enter admin",
        ]
    );
}

#[tokio::test]
async fn redirecting_to_itself_continues() {
    let fx = Fixture::new();
    fx.service.hooks().on_start(
        MatchCriteria::any(),
        HookCallback::from_fn(|ctx| Ok(HookResult::RedirectTo(ctx.transition().clone()))),
        None,
    );

    let t = fx.service.create(fx.at("root.parent.a"), fx.at("root.parent.b"), Default::default());
    let entered = t.run().await.unwrap();

    assert_eq!(entered.name(), "root.parent.b");
    assert_eq!(t.redirects().await.unwrap().name(), "root.parent.b");
    assert_eq!(fx.log(), vec!["exit root.parent.a", "enter root.parent.b"]);
}

#[tokio::test]
async fn hook_fault_fails_the_transition() {
    let fx = Fixture::new();
    fx.service.hooks().on_start(
        MatchCriteria::any(),
        HookCallback::from_fn(|_| Err(TransitionError::hook("database down"))),
        None,
    );

    let err = fx
        .service
        .transition_to(fx.at("root.parent.a"), fx.at("root.parent.b"), Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TransitionError::HookFailed { ref message } if message == "database down"));
    assert!(!err.is_rejection());
}

#[tokio::test]
async fn before_hooks_cannot_wait_for_dependencies() {
    let fx = Fixture::new();
    fx.service.hooks().on_before(
        MatchCriteria::any(),
        HookCallback::from_fn(|_| Ok(HookResult::Continue)).with_deps(["later"]),
        None,
    );

    let err = fx
        .service
        .transition_to(fx.at("root.parent.a"), fx.at("root.parent.b"), Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TransitionError::Unresolved { ref name } if name == "later"));
}

#[tokio::test]
async fn pending_before_hooks_settle_before_the_chain() {
    let fx = Fixture::new();
    fx.clear();
    let log = Arc::clone(&fx.log);
    fx.service.hooks().on_before(
        MatchCriteria::any(),
        HookCallback::from_future(move |_| {
            let log = Arc::clone(&log);
            async move {
                tokio::task::yield_now().await;
                log.lock().push("before settled".to_string());
                Ok(HookResult::Abort)
            }
        }),
        None,
    );
    fx.service
        .hooks()
        .on_start(MatchCriteria::any(), record(&fx.log, "onStart"), None);

    let err = fx
        .service
        .transition_to(fx.at("root.parent.a"), fx.at("root.parent.b"), Default::default())
        .await
        .unwrap_err();

    assert_eq!(kind(&err), Some(RejectionKind::Aborted));
    assert_eq!(fx.log(), vec!["before settled"]);
}

#[tokio::test]
async fn go_resolves_relative_targets() {
    let fx = Fixture::new();
    let from = fx.at("root.parent.a");
    let t = fx
        .service
        .go(&from, "^.b", StateParams::new(), TransitionOptions::default());

    assert_eq!(t.run().await.unwrap().name(), "root.parent.b");
}
