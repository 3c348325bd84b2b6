//! End-to-end scenarios driving whole actors through the public API.
//!
//! Run with: `cargo test --test e2e_actor`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use turnloop::{new_error_fmt, run_actor, Error, Event, EventSet, Promise, Source};

mod common {
    pub fn init_test_logging() {
        // Initialize tracing for tests if not already done.
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    }
}

#[test]
fn trivial_actor_completes_successfully() {
    common::init_test_logging();
    assert!(run_actor(|runner| runner.done()).is_ok());
}

#[test]
fn failed_actor_reports_its_error() {
    common::init_test_logging();
    let err = run_actor(|runner| runner.new_error("boom")).expect_err("root fails");
    assert_eq!(err.to_string(), "boom");
}

#[test]
fn spawned_work_runs_before_the_actor_exits() {
    common::init_test_logging();
    let steps = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&steps);
    let outcome = run_actor(move |runner| {
        log.lock().expect("steps lock").push("root");

        let inner_log = Arc::clone(&log);
        let done = runner.done();
        runner.spawn(move || {
            inner_log.lock().expect("steps lock").push("spawned");
            done
        })
    });

    assert!(outcome.is_ok());
    assert_eq!(*steps.lock().expect("steps lock"), vec!["root", "spawned"]);
}

#[test]
fn turns_enqueued_by_a_turn_run_after_already_queued_turns() {
    common::init_test_logging();
    let order = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&order);
    let outcome = run_actor(move |runner| {
        // Two sibling computations are queued up front. The first enqueues a
        // child mid-turn; the child runs after the second sibling, in the
        // next cycle.
        let (gate, gate_resolver) = runner.new_result::<()>();

        let first_log = Arc::clone(&log);
        let child_runner = runner.clone();
        let done = runner.done();
        let first = runner.spawn(move || {
            first_log.lock().expect("order lock").push("first");
            let child_log = Arc::clone(&first_log);
            let done_again = done.clone();
            child_runner.spawn(move || {
                child_log.lock().expect("order lock").push("child");
                done_again
            });
            done
        });

        let second_log = Arc::clone(&log);
        let done = runner.done();
        let second = runner.spawn(move || {
            second_log.lock().expect("order lock").push("second");
            done
        });

        let _ = first;
        let resolver = gate_resolver;
        let _ = second.map(move |()| resolver.complete(()));
        gate
    });

    assert!(outcome.is_ok());
    let order = order.lock().expect("order lock");
    let first_pos = order.iter().position(|s| *s == "first").expect("first ran");
    let second_pos = order.iter().position(|s| *s == "second").expect("second ran");
    let child_pos = order.iter().position(|s| *s == "child").expect("child ran");
    assert!(first_pos < second_pos, "siblings keep their queue order");
    assert!(second_pos < child_pos, "the child waits for the next cycle");
}

#[test]
fn io_completions_resolve_on_the_actor_thread() {
    common::init_test_logging();
    let started = Instant::now();
    let continuation_thread = Arc::new(Mutex::new(None));

    let observed = Arc::clone(&continuation_thread);
    let outcome = run_actor(move |runner| {
        let actor_thread = thread::current().id();
        let source = Source::new(&runner);
        let result = source
            .spawn(|| {
                thread::sleep(Duration::from_millis(100));
                Ok(())
            })
            .map(move |()| {
                *observed.lock().expect("thread slot") = Some((thread::current().id(), actor_thread));
            });
        result.finally(move || source.close())
    });

    assert!(outcome.is_ok());
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(100), "the worker really slept");
    assert!(elapsed < Duration::from_secs(5), "the completion arrived promptly");

    let (ran_on, actor_thread) = continuation_thread
        .lock()
        .expect("thread slot")
        .expect("continuation ran");
    assert_eq!(ran_on, actor_thread, "the continuation ran cooperatively");
}

#[test]
fn parallel_io_joins_back_into_one_result() {
    common::init_test_logging();
    let completed = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&completed);
    let outcome = run_actor(move |runner| {
        let source = Source::new(&runner);
        let (all_done, all_done_resolver) = runner.new_result::<()>();

        let remaining = Arc::new(AtomicUsize::new(4));
        for i in 0..4u64 {
            let counter = Arc::clone(&counter);
            let remaining = Arc::clone(&remaining);
            let all_done_resolver = all_done_resolver.clone();
            let _ = source
                .spawn(move || {
                    thread::sleep(Duration::from_millis(10 * i));
                    Ok(())
                })
                .map(move |()| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
                        all_done_resolver.complete(());
                    }
                });
        }

        all_done.finally(move || source.close())
    });

    assert!(outcome.is_ok());
    assert_eq!(completed.load(Ordering::SeqCst), 4);
}

#[test]
fn forwarding_routes_the_failure_to_early_observers() {
    common::init_test_logging();
    let observed = Arc::new(Mutex::new(None));

    let slot = Arc::clone(&observed);
    let outcome = run_actor(move |runner| {
        let (r1, s1) = runner.new_result::<()>();
        let r2: Promise<()> = runner.new_error("e");
        s1.forward(&r2);

        r1.then(move |outcome| {
            *slot.lock().expect("observed lock") =
                Some(outcome.expect_err("forwarded failure").to_string());
            Ok(())
        })
    });

    assert!(outcome.is_ok());
    assert_eq!(
        observed.lock().expect("observed lock").as_deref(),
        Some("e")
    );
}

#[test]
fn failures_short_circuit_a_combinator_chain() {
    common::init_test_logging();
    let skipped = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&skipped);
    let err = run_actor(move |runner| {
        let failing: Promise<()> = new_error_fmt!(runner, "step {} exploded", 1);
        failing
            .map({
                let counter = Arc::clone(&counter);
                move |()| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })
            .map({
                let counter = Arc::clone(&counter);
                move |()| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })
    })
    .expect_err("the failure reaches the root");

    assert_eq!(err.to_string(), "step 1 exploded");
    assert_eq!(
        skipped.load(Ordering::SeqCst),
        0,
        "no skipped continuation ever ran"
    );
}

#[test]
fn or_else_recovers_and_the_actor_succeeds() {
    common::init_test_logging();
    let outcome = run_actor(|runner| {
        let failing: Promise<()> = runner.new_error("recoverable");
        let fallback = runner.clone();
        failing.or_else(move |err| {
            assert_eq!(err.to_string(), "recoverable");
            fallback.done()
        })
    });
    assert!(outcome.is_ok());
}

#[test]
fn finally_runs_on_the_failure_path_and_preserves_it() {
    common::init_test_logging();
    let cleaned_up = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&cleaned_up);
    let err = run_actor(move |runner| {
        let failing: Promise<()> = runner.new_error("boom");
        failing.finally(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    })
    .expect_err("finally preserves the failure");

    assert_eq!(err.to_string(), "boom");
    assert_eq!(cleaned_up.load(Ordering::SeqCst), 1);
}

#[test]
fn typed_results_flow_through_the_graph() {
    common::init_test_logging();
    let rendered = Arc::new(Mutex::new(String::new()));

    let slot = Arc::clone(&rendered);
    let outcome = run_actor(move |runner| {
        let (numbers, numbers_resolver) = runner.new_result::<Vec<u32>>();

        let total = numbers.map(|values| values.iter().sum::<u32>());
        let report = total.map(|sum| format!("sum={sum}"));
        let stored = report.map(move |text| {
            *slot.lock().expect("rendered lock") = text;
        });

        numbers_resolver.complete(vec![1, 2, 3, 4]);
        stored
    });

    assert!(outcome.is_ok());
    assert_eq!(*rendered.lock().expect("rendered lock"), "sum=10");
}

#[test]
fn an_io_pipeline_composes_with_recovery() {
    common::init_test_logging();
    let attempts = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&attempts);
    let outcome = run_actor(move |runner| {
        let source = Source::new(&runner);

        let flaky = {
            let counter = Arc::clone(&counter);
            source.spawn(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(Error::new("first attempt failed"))
            })
        };

        let retried = {
            let counter = Arc::clone(&counter);
            let retry_source = Source::new(&runner);
            flaky.or_else(move |_| {
                let counter = Arc::clone(&counter);
                let retry = retry_source.spawn(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
                retry.finally(move || retry_source.close())
            })
        };

        retried.finally(move || source.close())
    });

    assert!(outcome.is_ok());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn events_collapse_double_signals_end_to_end() {
    common::init_test_logging();
    let mut set = EventSet::new();
    let event = Event::new("io");
    set.add(event.clone());

    event.signal();
    event.signal();
    assert!(set.select().is_some(), "one pulse is observable");
    assert!(set.select().is_none(), "the second collapsed into it");
}
