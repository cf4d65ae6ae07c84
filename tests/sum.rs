use mcpu::{
    config::RunConfig,
    emulator::{Cpu, RunOutcome},
    schedule::Schedule,
    translate, TranslateError,
};

const SOURCE: &str = include_str!("fixtures/sum.src");

#[test]
fn test_sum_emulate_program() {
    let image = translate(SOURCE).unwrap();

    let top = image.data.len() as u32 + 4096;
    let mut cpu = Cpu::new(image.code, image.data, Schedule::new(), &RunConfig::default());

    assert_eq!(cpu.run_to_end(), RunOutcome::Halted);
    assert_eq!(cpu.io.numbers(), vec![224, 2, 92, 224]);

    // Every block released its locals.
    assert_eq!(cpu.context.sp(), top);
}

#[test]
fn test_sum_tick_budget() {
    let image = translate(SOURCE).unwrap();
    let config = RunConfig::default().with_tick_budget(100);

    let mut cpu = Cpu::new(image.code, image.data, Schedule::new(), &config);

    assert_eq!(cpu.run_to_end(), RunOutcome::BudgetExhausted);
    assert_eq!(cpu.ticks(), 100);
    assert!(!cpu.is_halted());
}

#[test]
fn test_sum_verbose_errors() {
    let source = SOURCE.replace("sum = sum + v;", "sum = sun + v;");

    let err = translate(&source).unwrap_err();
    assert!(matches!(err, TranslateError::Compile(_)));

    let messages = err.verbose(&source);
    assert_eq!(messages, vec!["10:5: undeclared variable 'sun', did you mean 'sum'?"]);
}
