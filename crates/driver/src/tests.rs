#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use serde_json::json;
    use tokio::time::{sleep, timeout};

    use rewire_store::{Action, ActionPattern, Reducer, Store, Value};

    use crate::bind::bind;
    use crate::context::SagaContext;
    use crate::effect::{Effect, EffectOutcome};
    use crate::error::EffectError;
    use crate::mock::{structured_mocks, MockMapping, MockMode, MockRegistry, Resolved};
    use crate::saga::Saga;
    use crate::target::{call_fn, CallTarget, TaskHandler};

    fn plain_store() -> Store {
        Store::new(Reducer::identity(), Value::empty_map()).unwrap()
    }

    /// Store whose reducer records `complete` payloads under "value".
    fn completing_store() -> Store {
        let reducer = Reducer::single(|state: &Value, action: &Action| match action.kind.as_str() {
            "complete" => state.set("value", action.payload.clone()),
            _ => state.clone(),
        });
        Store::new(reducer, Value::empty_map()).unwrap()
    }

    fn bound(store: &Store, mocks: Vec<MockMapping>) -> SagaContext {
        bind(store, &[], &mocks, MockMode::Permissive)
    }

    /// Handler that forwards the action payload through `api`, then puts
    /// the result as a `complete` action.
    fn fetch_and_complete(api: CallTarget) -> TaskHandler {
        TaskHandler::new("fetch_and_complete", move |action: Action, ctx: SagaContext| {
            let api = api.clone();
            async move {
                let value = ctx.call(&api, vec![action.payload.clone()]).await?;
                ctx.put(Action::new("complete", value))?;
                Ok(())
            }
        })
    }

    // --- Mock registry ---

    #[test]
    fn test_registry_resolves_substitute() {
        let target = CallTarget::new("fetch", |_| Ok(Value::Str("real".into())));
        let mappings = vec![MockMapping::call(
            &target,
            call_fn(|_| Ok(Value::Str("mocked".into()))),
        )];
        let registry = MockRegistry::compile(&mappings);
        assert!(matches!(
            registry.resolve_call(&target),
            Resolved::Substituted(_)
        ));
        let other = CallTarget::new("other", |_| Ok(Value::Null));
        assert!(matches!(registry.resolve_call(&other), Resolved::Unmapped));
    }

    #[tokio::test]
    async fn test_registry_last_registration_wins() {
        let target = CallTarget::new("fetch", |_| Ok(Value::Str("real".into())));
        let mappings = vec![
            MockMapping::call(&target, call_fn(|_| Ok(Value::Str("first".into())))),
            MockMapping::call(&target, call_fn(|_| Ok(Value::Str("second".into())))),
        ];
        let registry = MockRegistry::compile(&mappings);
        match registry.resolve_call(&target) {
            Resolved::Substituted(f) => {
                assert_eq!(f(vec![]).await.unwrap(), Value::Str("second".into()));
            }
            Resolved::Unmapped => panic!("expected a substitute"),
        }
    }

    #[test]
    fn test_registry_compiled_from_nothing_is_empty() {
        assert!(MockRegistry::compile(&[]).is_empty());
        let target = CallTarget::new("fetch", |_| Ok(Value::Null));
        let registry =
            MockRegistry::compile(&[MockMapping::call(&target, call_fn(|_| Ok(Value::Null)))]);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_clones_share_identity() {
        let target = CallTarget::new("fetch", |_| Ok(Value::Null));
        let clone = target.clone();
        let registry = MockRegistry::compile(&[MockMapping::call(
            &target,
            call_fn(|_| Ok(Value::Null)),
        )]);
        assert!(matches!(
            registry.resolve_call(&clone),
            Resolved::Substituted(_)
        ));
    }

    #[test]
    fn test_structured_mocks_pairs_shared_names_only() {
        let original: BTreeMap<String, CallTarget> = [
            ("a".to_string(), CallTarget::new("a", |_| Ok(Value::Int(1)))),
            ("b".to_string(), CallTarget::new("b", |_| Ok(Value::Int(2)))),
            ("c".to_string(), CallTarget::new("c", |_| Ok(Value::Int(3)))),
        ]
        .into();
        let mocks: BTreeMap<String, _> = [
            ("a".to_string(), call_fn(|_| Ok(Value::Int(10)))),
            ("b".to_string(), call_fn(|_| Ok(Value::Int(20)))),
            // No "d" in the original bag: dropped without error.
            ("d".to_string(), call_fn(|_| Ok(Value::Int(40)))),
        ]
        .into();

        let mappings = structured_mocks(&original, &mocks);
        assert_eq!(mappings.len(), 2);
        let names: Vec<&str> = mappings
            .iter()
            .map(|m| match m {
                MockMapping::Call { name, .. } => name.as_ref(),
                MockMapping::Handler { name, .. } => name.as_ref(),
            })
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    // --- Call interception ---

    #[tokio::test]
    async fn test_substituted_call_never_runs_original() {
        let original_ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&original_ran);
        let fetch = CallTarget::new("fetch", move |_| {
            flag.store(true, Ordering::SeqCst);
            Err(EffectError::call("fetch", "must not run"))
        });

        let store = plain_store();
        let ctx = bound(
            &store,
            vec![MockMapping::call(
                &fetch,
                call_fn(|args| Ok(Value::List(args))),
            )],
        );

        let result = ctx
            .call(&fetch, vec![Value::Str("test url".into())])
            .await
            .unwrap();
        assert_eq!(result, Value::List(vec![Value::Str("test url".into())]));
        assert!(!original_ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_unmapped_call_falls_back_to_original() {
        let fetch = CallTarget::new("double", |args| {
            let n = args.first().and_then(Value::as_int).unwrap_or(0);
            Ok(Value::Int(n * 2))
        });
        let store = plain_store();
        let ctx = bound(&store, vec![]);
        let result = ctx.call(&fetch, vec![Value::Int(21)]).await.unwrap();
        assert_eq!(result, Value::Int(42));
    }

    #[tokio::test]
    async fn test_unmapped_method_runs_bound_to_object() {
        struct Recorder {
            seen: Mutex<Vec<Value>>,
        }
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let log = CallTarget::from_method("logger.log", Arc::clone(&recorder), |r, args| {
            r.seen.lock().unwrap().extend(args);
            Ok(Value::Bool(true))
        });

        let store = plain_store();
        let ctx = bound(&store, vec![]);
        let result = ctx.call(&log, vec![Value::Str("do it".into())]).await.unwrap();
        assert_eq!(result, Value::Bool(true));
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![Value::Str("do it".into())]
        );
    }

    #[tokio::test]
    async fn test_strict_mode_fails_on_unmapped_call() {
        let fetch = CallTarget::new("fetch", |_| Ok(Value::Null));
        let store = plain_store();
        let ctx = bind(&store, &[], &[], MockMode::Strict);
        assert_eq!(ctx.mock_mode(), MockMode::Strict);
        let err = ctx.call(&fetch, vec![]).await.unwrap_err();
        assert!(matches!(err, EffectError::UnmockedCall(ref name) if name == "fetch"));
    }

    #[tokio::test]
    async fn test_target_substituted_by_another_targets_impl() {
        let real = CallTarget::new("fetch", |_| Ok(Value::Str("real".into())));
        let stand_in = CallTarget::new("canned fetch", |_| Ok(Value::Str("canned".into())));
        let store = plain_store();
        let ctx = bound(&store, vec![MockMapping::call_target(&real, &stand_in)]);

        let result = ctx.call(&real, vec![]).await.unwrap();
        assert_eq!(result, Value::Str("canned".into()));
        // The stand-in itself stays unmapped.
        let result = ctx.call(&stand_in, vec![]).await.unwrap();
        assert_eq!(result, Value::Str("canned".into()));
    }

    // --- Context store access ---

    #[tokio::test]
    async fn test_unbound_context_names_the_operation() {
        let ctx = SagaContext::unbound();

        let err = ctx.put(Action::bare("x")).unwrap_err();
        assert!(err.to_string().contains("dispatch an action"));

        let err = ctx.select().unwrap_err();
        assert!(err.to_string().contains("read state"));

        let err = ctx.take(&ActionPattern::Any).await.unwrap_err();
        assert!(err.to_string().contains("take an action"));
    }

    #[tokio::test]
    async fn test_put_applies_synchronously() {
        let store = completing_store();
        let ctx = bound(&store, vec![]);
        ctx.put(Action::new("complete", Value::Int(5))).unwrap();
        assert_eq!(ctx.select().unwrap().get("value"), Some(&Value::Int(5)));
    }

    #[tokio::test]
    async fn test_take_resumes_on_matching_action() {
        let store = plain_store();
        let ctx = bound(&store, vec![]);

        let waiter = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.take(&ActionPattern::kind("wanted")).await })
        };
        tokio::task::yield_now().await; // let the take subscribe

        store.dispatch(Action::bare("ignored"));
        store.dispatch(Action::new("wanted", Value::Int(1)));

        let action = timeout(Duration::from_millis(100), waiter)
            .await
            .expect("take timed out")
            .unwrap()
            .unwrap();
        assert_eq!(action, Action::new("wanted", Value::Int(1)));
    }

    #[tokio::test]
    async fn test_race_returns_first_completed_branch() {
        let store = plain_store();
        let ctx = bound(&store, vec![]);
        let quick = CallTarget::new("quick", |_| Ok(Value::Str("done".into())));

        let (index, outcome) = ctx
            .race(vec![
                Effect::Take(ActionPattern::kind("never")),
                Effect::Call {
                    target: quick,
                    args: vec![],
                },
            ])
            .await
            .unwrap();
        assert_eq!(index, 1);
        match outcome {
            EffectOutcome::Value(v) => assert_eq!(v, Value::Str("done".into())),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_apply_drives_descriptors_end_to_end() {
        let store = completing_store();
        let ctx = bound(&store, vec![]);

        let outcome = ctx
            .apply(Effect::Put(Action::new("complete", Value::Int(1))))
            .await
            .unwrap();
        assert!(matches!(outcome, EffectOutcome::Done));

        match ctx.apply(Effect::Select).await.unwrap() {
            EffectOutcome::State(state) => {
                assert_eq!(state.get("value"), Some(&Value::Int(1)));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }

        let slow = CallTarget::new_async("slow", |args| async move {
            sleep(Duration::from_millis(30)).await;
            Ok(args.into_iter().next().unwrap_or(Value::Null))
        });
        let task = match ctx
            .apply(Effect::Spawn {
                handler: fetch_and_complete(slow),
                action: Action::new("go", Value::Int(2)),
            })
            .await
            .unwrap()
        {
            EffectOutcome::Task(task) => task,
            other => panic!("unexpected outcome: {other:?}"),
        };
        sleep(Duration::from_millis(5)).await;
        let outcome = ctx.apply(Effect::Cancel(task)).await.unwrap();
        assert!(matches!(outcome, EffectOutcome::Done));
        sleep(Duration::from_millis(50)).await;

        // The cancelled task's put never landed.
        assert_eq!(store.state().get("value"), Some(&Value::Int(1)));
    }

    #[tokio::test]
    async fn test_cancelled_spawn_never_puts() {
        let store = completing_store();
        let ctx = bound(&store, vec![]);
        let slow = CallTarget::new_async("slow", |args| async move {
            sleep(Duration::from_millis(30)).await;
            Ok(args.into_iter().next().unwrap_or(Value::Null))
        });
        let handler = fetch_and_complete(slow);

        let task = ctx.spawn(&handler, Action::new("go", Value::Int(1)));
        sleep(Duration::from_millis(5)).await; // suspend inside the call
        task.cancel();
        sleep(Duration::from_millis(50)).await;

        assert_eq!(store.state().get("value"), None);
    }

    // --- Watch driver ---

    #[tokio::test]
    async fn test_watch_latest_cancels_in_flight_handler() {
        let store = completing_store();
        let slow = CallTarget::new_async("api", |args| async move {
            sleep(Duration::from_millis(30)).await;
            Ok(args.into_iter().next().unwrap_or(Value::Null))
        });
        let saga = Saga::new("loader").watch_latest("load", fetch_and_complete(slow));
        bind(&store, &[saga], &[], MockMode::Permissive);

        store.dispatch(Action::new("load", Value::Str("one".into())));
        sleep(Duration::from_millis(5)).await; // first handler suspends in the call
        store.dispatch(Action::new("load", Value::Str("two".into())));
        sleep(Duration::from_millis(60)).await;

        // Only the later invocation's consequences are observable.
        assert_eq!(
            store.state().get("value"),
            Some(&Value::Str("two".into()))
        );
        let completes: Vec<_> = store
            .dispatched()
            .into_iter()
            .filter(|a| a.kind == "complete")
            .collect();
        assert_eq!(completes.len(), 1);
        assert_eq!(completes[0].payload, Value::Str("two".into()));
    }

    #[tokio::test]
    async fn test_watch_every_runs_all_invocations() {
        let store = completing_store();
        let echo = CallTarget::new("echo", |args| {
            Ok(args.into_iter().next().unwrap_or(Value::Null))
        });
        let saga = Saga::new("loader").watch_every("load", fetch_and_complete(echo));
        bind(&store, &[saga], &[], MockMode::Permissive);

        for n in 0..3 {
            store.dispatch(Action::new("load", Value::Int(n)));
        }
        sleep(Duration::from_millis(20)).await;

        let completes: Vec<_> = store
            .dispatched()
            .into_iter()
            .filter(|a| a.kind == "complete")
            .map(|a| a.payload)
            .collect();
        assert_eq!(completes, vec![Value::Int(0), Value::Int(1), Value::Int(2)]);
    }

    #[tokio::test]
    async fn test_watched_handler_substitution_replaces_routine() {
        let store = completing_store();
        let original_ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&original_ran);
        let routine = TaskHandler::new("do_something", move |_action, _ctx| {
            flag.store(true, Ordering::SeqCst);
            async { Ok(()) }
        });
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_mock = Arc::clone(&seen);
        let substitute = TaskHandler::new("mock_do_something", move |action: Action, _ctx| {
            seen_by_mock.lock().unwrap().push(action);
            async { Ok(()) }
        });

        let saga = Saga::new("loader").watch_latest("load", routine.clone());
        bind(
            &store,
            &[saga],
            &[MockMapping::handler(&routine, &substitute)],
            MockMode::Permissive,
        );

        let trigger = Action::new("load", Value::Str("one".into()));
        store.dispatch(trigger.clone());
        sleep(Duration::from_millis(20)).await;

        assert!(!original_ran.load(Ordering::SeqCst));
        assert_eq!(*seen.lock().unwrap(), vec![trigger]);
    }

    #[tokio::test]
    async fn test_non_matching_actions_do_not_trigger_watch() {
        let store = completing_store();
        let echo = CallTarget::new("echo", |args| {
            Ok(args.into_iter().next().unwrap_or(Value::Null))
        });
        let saga = Saga::new("loader").watch_every("load", fetch_and_complete(echo));
        bind(&store, &[saga], &[], MockMode::Permissive);

        store.dispatch(Action::new("unrelated", Value::from(json!("x"))));
        sleep(Duration::from_millis(20)).await;

        assert!(store.dispatched().iter().all(|a| a.kind != "complete"));
    }
}
