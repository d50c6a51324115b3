#![no_main]

use core::fmt;

use itertools::Itertools;
use libfuzzer_sys::{arbitrary::Arbitrary, fuzz_target};

// A handful of names so that bindings collide often
#[derive(Arbitrary, Debug)]
enum BoiName {
    A, B, N, F, G,
}

impl fmt::Display for BoiName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            BoiName::A => "a",
            BoiName::B => "b",
            BoiName::N => "n",
            BoiName::F => "f",
            BoiName::G => "g",
        })
    }
}

#[derive(Arbitrary, Debug)]
enum BoiComparison {
    Greater, GreaterEq, Less, LessEq, Eq, NotEq,
}

impl fmt::Display for BoiComparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self {
            BoiComparison::Greater => ">",
            BoiComparison::GreaterEq => ">=",
            BoiComparison::Less => "<",
            BoiComparison::LessEq => "<=",
            BoiComparison::Eq => "==",
            BoiComparison::NotEq => "!=",
        })
    }
}

#[derive(Arbitrary, Debug)]
enum BoiExpr {
    Number(u8),
    Var(BoiName),
    Add(Box<BoiExpr>, Box<BoiExpr>),
    Sub(Box<BoiExpr>, Box<BoiExpr>),
    Let(BoiName, Box<BoiExpr>, Box<BoiExpr>),
    Lambda(BoiName, Vec<BoiName>, Box<BoiExpr>, Box<BoiExpr>),
    Call(BoiName, Vec<BoiExpr>),
    If(Box<BoiExpr>, Option<BoiComparison>, Box<BoiExpr>, Box<BoiExpr>, Box<BoiExpr>),
}

fn stringify_params(params: &[BoiName]) -> String {
    match params.len() {
        0 => "()".to_owned(),
        _ => params.iter().join(" "),
    }
}

impl fmt::Display for BoiExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoiExpr::Number(number) => write!(f, "{}", number),
            BoiExpr::Var(name) => write!(f, "{}", name),
            BoiExpr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            BoiExpr::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            BoiExpr::Let(name, value, body) => write!(f, "(let {} = {} in {})", name, value, body),
            BoiExpr::Lambda(name, params, value, usage)
                => write!(f, "(let {} {} = {} in {})", name, stringify_params(params), value, usage),
            BoiExpr::Call(name, arguments) if arguments.is_empty() => write!(f, "({} ())", name),
            BoiExpr::Call(name, arguments)
                => write!(f, "({} {})", name, arguments.iter().map(|argument| format!("({})", argument)).join(" ")),
            BoiExpr::If(lhs, Some(op), rhs, true_branch, false_branch)
                => write!(f, "(if {} {} {} then {} else {})", lhs, op, rhs, true_branch, false_branch),
            BoiExpr::If(condition, None, _, true_branch, false_branch)
                => write!(f, "(if {} then {} else {})", condition, true_branch, false_branch),
        }
    }
}

#[derive(Arbitrary, Debug)]
enum BoiDeclaration {
    Function(BoiName, Vec<BoiName>, BoiExpr),
    Expression(BoiExpr),
}

impl fmt::Display for BoiDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoiDeclaration::Function(name, params, body) => write!(f, "let {} {} = {}", name, stringify_params(params), body),
            BoiDeclaration::Expression(expr) => write!(f, "{}", expr),
        }
    }
}

fuzz_target!(|declarations: Vec<BoiDeclaration>| {
    let source = declarations.iter().join(";\n");
    let Ok(declarations) = boi::parse(&source) else {
        panic!("generated source should always parse:\n{}", source);
    };

    let mut program = boi::Program::new(declarations);
    while let Some(result) = program.step() {
        if let Err(err) = result {
            assert!(!err.is_fatal(), "{}", err.report());
        }
        assert_eq!(program.context().frame_depth(), 1);
        assert_eq!(program.context().current_variables().count(), 0);
    }
});
