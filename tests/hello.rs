use mcpu::{
    config::RunConfig,
    emulator::{Cpu, RunOutcome, TraceKind},
    image::{self, Image},
    instruction::{decode, OpCode},
    schedule::Schedule,
    symbol_table::SymbolType,
    translate,
};

fn compile_program() -> Image {
    let source = include_str!("fixtures/hello.src");

    translate(source).expect("could not translate hello.src")
}

fn run(image: &Image) -> Cpu {
    let mut cpu = Cpu::new(image.code.clone(), image.data.clone(), Schedule::new(), &RunConfig::default());

    assert_eq!(cpu.run_to_end(), RunOutcome::Halted);

    cpu
}

#[test]
fn test_hello_image() {
    let image = compile_program();

    assert_eq!(&image.data[..14], b"Hello, world!\n");
    assert_eq!(image.globals.get("greeting").unwrap().ty, SymbolType::Str { len: 14 });

    assert_eq!(image.listing[0], "0000: JMP 0x0006");
    assert_eq!(decode(*image.code.last().unwrap()).unwrap().opcode, OpCode::Halt);
}

#[test]
fn test_hello_emulate_program() {
    let image = compile_program();
    let cpu = run(&image);

    for entry in cpu.trace() {
        println!("{:>6} {:04x} {}", entry.tick, entry.pc, entry.kind);
    }

    assert_eq!(cpu.io.text(), "Hello, world!\n");
    assert_eq!(cpu.io.numbers(), vec![72, 42, 1, -2, 3]);

    assert!(!cpu
        .trace()
        .iter()
        .any(|entry| matches!(entry.kind, TraceKind::Skipped { .. })));
}

#[test]
fn test_hello_saved_images() {
    let image = compile_program();

    let prefix = std::env::temp_dir().join(format!("mcpu-hello-{}", std::process::id()));
    image.save(&prefix).unwrap();

    let (code, data) = image::load(&prefix).unwrap();

    std::fs::remove_file(prefix.with_extension("code")).unwrap();
    std::fs::remove_file(prefix.with_extension("data")).unwrap();

    assert_eq!(code, image.code);
    assert_eq!(data, image.data);

    let mut cpu = Cpu::new(code, data, Schedule::new(), &RunConfig::default());
    cpu.run_to_end();

    assert_eq!(cpu.io.text(), run(&image).io.text());
}
