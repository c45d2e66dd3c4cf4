use norma::{
    parse_macros, parse_program, Instruction, LineError, Loader, Op, ParseError, ParseMode,
};
use pretty_assertions::assert_eq;

fn lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

#[test]
fn program_header_and_instructions() {
    let program = parse_program(lines(
        "2 ; registers\n\
         3 0\n\
         ; move r0 into r1\n\
         \n\
         0: if zero_0 then goto 2 else goto 1\n\
         1: do add_1 goto 3\n\
         3: do sub_0 goto 0 ; back to the test\n",
    ))
    .unwrap();

    assert_eq!(program.registers, 2);
    assert_eq!(program.initial_values, vec![3, 0]);
    assert_eq!(
        program.instructions,
        vec![
            Instruction::zero(0, 0, 2, 1),
            Instruction::add(1, 1, 3),
            Instruction::sub(3, 0, 0),
        ]
    );
    assert_eq!(program.entry(), Some(&Instruction::zero(0, 0, 2, 1)));
}

#[test]
fn source_order_is_kept() {
    let program = parse_program(lines("1\n0\n9: add_0 then 2\n2: sub_0 then 9\n")).unwrap();
    let labels: Vec<u32> = program.instructions.iter().map(|inst| inst.label).collect();
    assert_eq!(labels, vec![9, 2]);
}

#[test]
fn unlabeled_line_is_skipped_without_disturbing_the_rest() {
    let program = parse_program(lines("1\n0\nfoo bar\n0: add_0 then 1\n")).unwrap();
    assert_eq!(program.instructions, vec![Instruction::add(0, 0, 1)]);
}

#[test]
fn register_count_mismatch() {
    let error = parse_program(lines("3\n1 2\n")).unwrap_err();
    assert_eq!(
        error,
        ParseError::RegisterCountMismatch {
            declared: 3,
            supplied: 2,
        }
    );
}

#[test]
fn missing_or_invalid_header() {
    assert_eq!(parse_program(Vec::<&str>::new()).unwrap_err(), ParseError::MissingRegisterCount);
    assert_eq!(parse_program(lines("1\n")).unwrap_err(), ParseError::MissingInitialValues);
    assert_eq!(
        parse_program(lines("two\n1 2\n")).unwrap_err(),
        ParseError::InvalidRegisterCount("two".into())
    );
    assert_eq!(
        parse_program(lines("2\n1 x\n")).unwrap_err(),
        ParseError::InvalidInitialValue("x".into())
    );
}

#[test]
fn zero_registers() {
    let program = parse_program(lines("0\n\n")).unwrap();
    assert_eq!(program.registers, 0);
    assert!(program.initial_values.is_empty());
    assert!(program.instructions.is_empty());
}

#[test]
fn strict_mode_rejects_malformed_labeled_line() {
    let error = parse_program(lines("1\n0\n0: add_0 then 1\n1: add_x then 2\n")).unwrap_err();
    assert_eq!(
        error,
        ParseError::Line {
            line: 4,
            source: LineError::InvalidRegister("x".into()),
        }
    );
    assert_eq!(error.to_string(), "line 4: register 'x' is not a non-negative integer");
}

#[test]
fn lenient_mode_drops_and_records_malformed_lines() {
    let mut loader = Loader::with_mode(ParseMode::Lenient);
    let program = loader
        .load_program(lines(
            "1\n\
             0\n\
             0: add_0 then 1\n\
             x: add_0 then 1\n\
             1: add_0\n\
             1: sub_0 then 2\n",
        ))
        .unwrap();

    assert_eq!(
        program.instructions,
        vec![Instruction::add(0, 0, 1), Instruction::sub(1, 0, 2)]
    );
    assert_eq!(
        loader.warnings(),
        &[
            ParseError::Line {
                line: 4,
                source: LineError::InvalidLabel("x".into()),
            },
            ParseError::Line {
                line: 5,
                source: LineError::TooFewTokens(2),
            },
        ]
    );
}

#[test]
fn lenient_mode_still_rejects_register_mismatch() {
    let mut loader = Loader::with_mode(ParseMode::Lenient);
    assert!(matches!(
        loader.load_program(lines("2\n0\n")),
        Err(ParseError::RegisterCountMismatch { .. })
    ));
}

#[test]
fn macro_blocks() {
    let macros = parse_macros(lines(
        "; helpers\n\
         clear:\n\
         0: if zero_0 then goto 2 else goto 1\n\
         1: do sub_0 goto 0\n\
         \n\
         nothing:\n\
         twice: ; calls clear twice\n\
         0: do clear goto 1\n\
         1: do clear goto 2\n",
    ))
    .unwrap();

    assert_eq!(macros.names(), vec!["clear", "nothing", "twice"]);
    assert_eq!(macros.get("clear").unwrap().body.len(), 2);
    assert!(macros.get("nothing").unwrap().body.is_empty());

    let twice = macros.get("twice").unwrap();
    assert_eq!(twice.body[0].op, Op::Macro("clear".into()));
    assert_eq!(twice.body.first(), Some(&Instruction::call(0, "clear", 1)));
}

#[test]
fn macro_header_with_portuguese_body() {
    let macros = parse_macros(lines(
        "soma:\n\
         1: se zero_1 então vá_para 9 senão vá_para 2\n\
         2: faça sub_1 vá_para 3\n\
         3: faça add_0 vá_para 1\n",
    ))
    .unwrap();
    assert_eq!(
        macros.get("soma").unwrap().body,
        vec![
            Instruction::zero(1, 1, 9, 2),
            Instruction::sub(2, 1, 3),
            Instruction::add(3, 0, 1),
        ]
    );
}

#[test]
fn instruction_before_first_macro() {
    let error = parse_macros(lines("0: add_0 then 1\nm:\n")).unwrap_err();
    assert_eq!(error, ParseError::InstructionOutsideMacro { line: 1 });

    let mut loader = Loader::with_mode(ParseMode::Lenient);
    let macros = loader.load_macros(lines("0: add_0 then 1\nm:\n0: sub_0 then 1\n")).unwrap();
    assert_eq!(macros.get("m").unwrap().body, vec![Instruction::sub(0, 0, 1)]);
    assert_eq!(loader.warnings(), &[ParseError::InstructionOutsideMacro { line: 1 }]);
}

#[test]
fn duplicate_macro_names() {
    let source = lines("m:\n0: add_0 then 1\nm:\n0: sub_0 then 1\n");
    assert_eq!(
        parse_macros(source.clone()).unwrap_err(),
        ParseError::DuplicateMacro {
            line: 3,
            name: "m".into(),
        }
    );

    let mut loader = Loader::with_mode(ParseMode::Lenient);
    let macros = loader.load_macros(source).unwrap();
    assert_eq!(macros.get("m").unwrap().body, vec![Instruction::sub(0, 0, 1)]);
    assert_eq!(loader.warnings().len(), 1);
}

#[test]
fn invalid_macro_name() {
    let error = parse_macros(lines("two words:\n")).unwrap_err();
    assert_eq!(
        error,
        ParseError::InvalidMacroName {
            line: 1,
            name: "two words".into(),
        }
    );
}

#[test]
fn macro_name_with_register_separator_is_rejected() {
    // Call sites would read `move_r0` as operation `move` on register `r0`.
    let error = parse_macros(lines("move_r0:\n0: add_0 then 1\n")).unwrap_err();
    assert_eq!(
        error,
        ParseError::InvalidMacroName {
            line: 1,
            name: "move_r0".into(),
        }
    );

    let mut loader = Loader::with_mode(ParseMode::Lenient);
    let macros = loader.load_macros(lines("move_r0:\n0: add_0 then 1\nmove:\n0: add_1 then 1\n")).unwrap();
    assert_eq!(macros.names(), vec!["move"]);
    assert_eq!(
        loader.warnings(),
        &[
            ParseError::InvalidMacroName {
                line: 1,
                name: "move_r0".into(),
            },
            ParseError::InstructionOutsideMacro { line: 2 },
        ]
    );
}

#[test]
fn malformed_line_inside_macro_body() {
    let source = lines("m:\n0: add_0 then 1\n1: add_x then 2\n2: sub_0 then 3\n");
    assert_eq!(
        parse_macros(source.clone()).unwrap_err(),
        ParseError::Line {
            line: 3,
            source: LineError::InvalidRegister("x".into()),
        }
    );

    let mut loader = Loader::with_mode(ParseMode::Lenient);
    let macros = loader.load_macros(source).unwrap();
    assert_eq!(
        macros.get("m").unwrap().body,
        vec![Instruction::add(0, 0, 1), Instruction::sub(2, 0, 3)]
    );
    assert_eq!(
        loader.warnings(),
        &[ParseError::Line {
            line: 3,
            source: LineError::InvalidRegister("x".into()),
        }]
    );
}

#[test]
fn unlabeled_text_is_skipped_anywhere_in_macro_source() {
    let macros = parse_macros(lines(
        "stray text\n\
         m:\n\
         more stray text\n\
         0: add_0 then 1\n",
    ))
    .unwrap();
    assert_eq!(macros.get("m").unwrap().body, vec![Instruction::add(0, 0, 1)]);
}

#[test]
fn warnings_belong_to_the_last_load() {
    let mut loader = Loader::with_mode(ParseMode::Lenient);
    loader.load_program(lines("1\n0\nx: add_0 then 1\n")).unwrap();
    assert_eq!(loader.warnings().len(), 1);

    loader.load_program(lines("1\n0\n0: add_0 then 1\n")).unwrap();
    assert!(loader.warnings().is_empty());

    loader.load_macros(lines("0: add_0 then 1\nm:\n")).unwrap();
    assert_eq!(loader.warnings(), &[ParseError::InstructionOutsideMacro { line: 1 }]);

    loader.load_macros(lines("m:\n0: add_0 then 1\n")).unwrap();
    assert!(loader.warnings().is_empty());
}

#[test]
fn listed_instructions_parse_back_to_the_same_instruction() {
    let program = parse_program(lines(
        "2\n\
         0 0\n\
         0: mul_0 then 1\n\
         1: mul_1 then 2\n\
         2: double then 3\n\
         3: add then 4\n\
         4: zero_1 then 5 else 6\n",
    ))
    .unwrap();
    for inst in program.instructions.iter() {
        let text = inst.to_string();
        assert_eq!(norma::parse_line(&text), Ok(Some(inst.clone())), "{}", text);
    }
}
