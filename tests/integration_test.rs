use dansk::{
    compiler::compile,
    vm::{self, FrameLayout, RuntimeError, Vm, VmConfig},
};

fn test_valid_program(source: &str, expected_output: &str) {
    let program = compile(source, "test.dk").expect("Compile should work on valid program");
    let output = vm::run(&program, VmConfig::default()).expect("Run should work on valid program");
    assert_eq!(output, expected_output);
}

fn first_error(source: &str) -> String {
    let error = compile(source, "test.dk").expect_err("Compile should fail on invalid program");
    assert!(!error.diagnostics.is_empty());
    error.first().map(|d| d.message()).unwrap_or_default()
}

#[test]
fn test_fakultet() {
    let source = r#"
    Offentlig funktion hovedprogram tilbagegiver heltal.
    Goddag.
        Lad K være et heltal.
        Gem et i K.
        Imens K er mindre end syv.
        Goddag.
            Print (fakultet af K).
            Gem (læg K sammen med et) i K.
        Farvel.
    Farvel.

    Offentlig funktion fakultet af (N som heltal) tilbagegiver heltal.
    Goddag.
        Hvis N er mindre end to.
        Goddag.
            Tilbagegiv et.
        Farvel.
        Tilbagegiv gang N med (fakultet af (træk N fra et)).
    Farvel.
    "#;
    test_valid_program(source, "1\n2\n6\n24\n120\n720\n");
}

#[test]
fn test_fibonacci() {
    let source = r#"
    Offentlig funktion hovedprogram tilbagegiver heltal.
    Goddag.
        Lad A være et heltal.
        Lad B være et heltal.
        Lad C være et heltal.
        Gem nul i A.
        Gem et i B.
        Imens A er mindre end tyve.
        Goddag.
            Print A.
            Læg A sammen med B, og gem det i C.
            Gem B i A.
            Gem C i B.
        Farvel.
    Farvel.
    "#;
    test_valid_program(source, "0\n1\n1\n2\n3\n5\n8\n13\n");
}

#[test]
fn test_overloads_by_type() {
    let source = r#"
    Offentlig funktion hovedprogram tilbagegiver heltal.
    Goddag.
        Print (halvdelen af ni).
        Print (halvdelen af 9,0).
    Farvel.

    Offentlig funktion halvdelen af (X som heltal) tilbagegiver heltal.
    Goddag.
        Tilbagegiv del X med to.
    Farvel.

    Offentlig funktion halvdelen af (X som flyder) tilbagegiver flyder.
    Goddag.
        Tilbagegiv del X med 2,0.
    Farvel.
    "#;
    test_valid_program(source, "4\n4.5\n");
}

#[test]
fn test_boolean_function() {
    let source = r#"
    Offentlig funktion hovedprogram tilbagegiver heltal.
    Goddag.
        Print (fire er lige).
        Print (syv er lige).
    Farvel.

    Offentlig funktion (N som heltal) er lige tilbagegiver påstand.
    Goddag.
        Tilbagegiv (gang (del N med to) med to) er lig med N.
    Farvel.
    "#;
    test_valid_program(source, "sand\nfalsk\n");
}

#[test]
fn test_nested_if_else() {
    let source = r#"
    Offentlig funktion hovedprogram tilbagegiver heltal.
    Goddag.
        Lad A være et heltal.
        Gem nul i A.
        Imens A er mindre end fire.
        Goddag.
            Hvis A er lig med nul.
            Goddag.
                Print 100.
            Farvel.
            Ellers.
            Goddag.
                Hvis A er større end to.
                Goddag.
                    Print 300.
                Farvel.
                Ellers.
                Goddag.
                    Print 200.
                Farvel.
            Farvel.
            Gem (læg A sammen med et) i A.
        Farvel.
    Farvel.
    "#;
    test_valid_program(source, "100\n200\n200\n300\n");
}

#[test]
fn test_early_return_leaves_one_value() {
    let source = r#"
    Offentlig funktion hovedprogram tilbagegiver heltal.
    Goddag.
        Print 1.
        Tilbagegiv 0.
        Print 2.
    Farvel.
    "#;
    test_valid_program(source, "1\n");
}

#[test]
fn test_fixed_frames_match_derived() {
    let source = r#"
    Offentlig funktion hovedprogram tilbagegiver heltal.
    Goddag.
        Print (summen af fire).
    Farvel.

    Offentlig funktion summen af (N som heltal) tilbagegiver heltal.
    Goddag.
        Lad S være et heltal.
        Gem nul i S.
        Imens N er større end nul.
        Goddag.
            Gem (læg S sammen med N) i S.
            Gem (træk N fra et) i N.
        Farvel.
        Tilbagegiv S.
    Farvel.
    "#;
    let program = compile(source, "test.dk").unwrap();
    let derived = vm::run(&program, VmConfig::default()).unwrap();
    let fixed = vm::run(
        &program,
        VmConfig {
            frame_layout: FrameLayout::COMPATIBLE,
            ..VmConfig::default()
        },
    )
    .unwrap();
    assert_eq!(derived, "10\n");
    assert_eq!(fixed, derived);
}

#[test]
fn test_infinite_loop_hits_step_limit() {
    let source = r#"
    Offentlig funktion hovedprogram tilbagegiver heltal.
    Goddag.
        Imens sand.
        Goddag.
        Farvel.
    Farvel.
    "#;
    let program = compile(source, "test.dk").unwrap();
    let config = VmConfig {
        step_limit: Some(1_000),
        ..VmConfig::default()
    };
    assert_eq!(vm::run(&program, config), Err(RuntimeError::StepLimit(1_000)));
}

#[test]
fn test_division_by_zero() {
    let source = r#"
    Offentlig funktion hovedprogram tilbagegiver heltal.
    Goddag.
        Print (del et med nul).
    Farvel.
    "#;
    let program = compile(source, "test.dk").unwrap();
    assert_eq!(
        vm::run(&program, VmConfig::default()),
        Err(RuntimeError::DivisionByZero)
    );
}

#[test]
fn test_output_before_runtime_error_is_kept() {
    let source = r#"
    Offentlig funktion hovedprogram tilbagegiver heltal.
    Goddag.
        Print et.
        Print (del et med nul).
    Farvel.
    "#;
    let program = compile(source, "test.dk").unwrap();
    let mut vm = Vm::new(&program, VmConfig::default());
    assert_eq!(vm.run(), Err(RuntimeError::DivisionByZero));
    assert_eq!(vm.output(), "1\n");
}

#[test]
fn test_unresolved_function() {
    let source = r#"
    Offentlig funktion hovedprogram tilbagegiver heltal.
    Goddag.
        Print (kvadratet af syv).
    Farvel.
    "#;
    assert_eq!(
        first_error(source),
        "Unresolved function\n    Pattern: kvadratet af <heltal>"
    );
    let error = compile(source, "test.dk").unwrap_err();
    assert_eq!(error.diagnostics.len(), 1);
}

#[test]
fn test_unexpected_token() {
    let source = "Offentlig funktion f heltal. Goddag. Farvel.";
    assert_eq!(
        first_error(source),
        "Unexpected token\n    Wanted: tilbagegiver\n    Given:  '.'"
    );
}

#[test]
fn test_rendered_diagnostic() {
    let source = "Offentlig funktion f tilbagegiver heltal.\nGoddag.\n    Print Q.\nFarvel.\n";
    let error = compile(source, "prog.dk").unwrap_err();
    let rendered = error.first().unwrap().render(source);
    assert_eq!(
        rendered,
        "Compilation error: Unresolved function\n    Pattern: Print Q\n\n\
         prog.dk(3:5) Print Q.\n             ^\n"
    );
}
