use std::borrow::Cow;

use bencher::{run_tests_console, Bencher, TestDesc, TestDescAndFn, TestFn, TestOpts};
use snooze_task::{task_fn, Advance, Task};

struct JoinBench {
    tasks: usize,
    yields: usize,
}

impl JoinBench {
    fn new(tasks: usize, yields: usize) -> Self {
        Self { tasks, yields }
    }
}

impl bencher::TDynBenchFn for JoinBench {
    fn run(&self, b: &mut Bencher) {
        let tasks = self.tasks;
        let yields = self.yields;
        let mut cx = futures_test::task::noop_context();
        b.iter(|| {
            let mut join = snooze_util::join_all((0..tasks).map(|_| run_yields(yields)));
            loop {
                if let Advance::Completed(outputs) = join.advance(&mut cx) {
                    break outputs;
                }
            }
        })
    }
}

/// Suspends `yields` times, waking itself each time.
fn run_yields(yields: usize) -> impl Task<Output = ()> {
    let mut remaining = yields;
    task_fn(move |cx| {
        if remaining == 0 {
            return Advance::Completed(());
        }
        remaining -= 1;
        cx.waker().wake_by_ref();
        Advance::Suspended
    })
}

pub fn benches() -> Vec<TestDescAndFn> {
    let mut benches = vec![];
    for tasks in [1, 32, 128] {
        for yields in [1, 8, 32] {
            benches.push(TestDescAndFn {
                desc: TestDesc {
                    name: Cow::from(format!(
                        "bench_join_yield/tasks={}/yields={}",
                        tasks, yields
                    )),
                    ignore: false,
                },
                testfn: TestFn::DynBenchFn(Box::new(JoinBench::new(tasks, yields))),
            });
        }
    }
    benches
}

fn main() {
    let mut test_opts = TestOpts::default();
    if let Some(arg) = std::env::args().skip(1).find(|arg| *arg != "--bench") {
        test_opts.filter = Some(arg);
    }

    run_tests_console(&test_opts, benches()).unwrap();
}
