use mcpu::{
    config::RunConfig,
    emulator::{Cpu, RunOutcome, TraceKind},
    event::Event,
    schedule::Schedule,
    translate_with_logger,
};

use slog::{o, Drain, Logger};

fn logger() -> Logger {
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Logger::root(drain, o!())
}

fn build() -> Cpu {
    let image = translate_with_logger(include_str!("fixtures/echo.src"), logger()).unwrap();
    let schedule = Schedule::parse(include_str!("fixtures/echo.sched")).unwrap();

    Cpu::with_logger(image.code, image.data, schedule, &RunConfig::default(), logger())
}

#[test]
fn test_echo_emulate_program() {
    let mut cpu = build();

    let mut returns = 0;
    cpu.add_listener(move |event: &Event| {
        if let Event::InterruptReturned = event {
            returns += 1;
            println!("returned {} times", returns);
        }
    });

    assert_eq!(cpu.run_to_end(), RunOutcome::Halted);

    assert_eq!(cpu.io.numbers(), vec![b'a' as i32, b'b' as i32, 2]);
    assert_eq!(cpu.io.text(), "received: ");
    assert!(cpu.io.pending_schedule().is_empty());
    assert!(!cpu.interrupts_enabled());
}

#[test]
fn test_echo_handlers_resume_main_program() {
    let mut cpu = build();
    cpu.run_to_end();

    let trace = cpu.trace();

    let entered = trace
        .iter()
        .enumerate()
        .filter(|(_, entry)| matches!(entry.kind, TraceKind::InterruptEntered { .. }))
        .collect::<Vec<_>>();

    assert_eq!(entered.len(), 3);

    for (index, entry) in entered {
        assert!(entry.tick >= 20);

        // The first fetch after the matching return continues where the handler cut in.
        let returned = trace[index..]
            .iter()
            .position(|e| e.kind == TraceKind::InterruptReturned)
            .unwrap()
            + index;

        let resumed = trace[returned..]
            .iter()
            .find(|e| matches!(e.kind, TraceKind::Fetch { .. }))
            .unwrap();

        assert_eq!(resumed.pc, entry.pc);
    }
}

#[test]
fn test_echo_is_deterministic() {
    let first = {
        let mut cpu = build();
        cpu.run_to_end();
        (cpu.trace().to_vec(), cpu.io.outputs().clone(), cpu.context.clone())
    };

    let mut cpu = build();
    cpu.run_to_end();

    assert_eq!(first, (cpu.trace().to_vec(), cpu.io.outputs().clone(), cpu.context.clone()));
}
