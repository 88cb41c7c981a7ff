use std::collections::HashMap;

use proptest::prelude::*;
use sempred_common::Value;
use sempred_engine::{
    eval::evaluate,
    expr::{parse, BinaryOp, ExpressionNode, Literal, UnaryOp},
    PredicateError,
};

fn literal() -> impl Strategy<Value = Literal> {
    prop_oneof![
        any::<bool>().prop_map(Literal::Bool),
        (0..=i64::MAX).prop_map(Literal::Int),
        (0.0..1e300f64).prop_map(Literal::Float),
        "[ -~é\n\t\"'\\\\]{0,8}".prop_map(Literal::Str),
    ]
}

fn identifier() -> impl Strategy<Value = String> {
    "[a-z_][a-zA-Z0-9_]{0,6}".prop_filter("keywords are not identifiers", |name| {
        name != "true" && name != "false"
    })
}

fn expression() -> impl Strategy<Value = ExpressionNode> {
    let leaf = prop_oneof![
        literal().prop_map(ExpressionNode::Literal),
        identifier().prop_map(ExpressionNode::Identifier),
    ];
    leaf.prop_recursive(6, 48, 4, |inner| {
        prop_oneof![
            (prop_oneof![Just(UnaryOp::Not), Just(UnaryOp::Neg)], inner.clone())
                .prop_map(|(op, operand)| ExpressionNode::unary(op, operand)),
            (proptest::sample::select(BinaryOp::ALL.to_vec()), inner.clone(), inner.clone())
                .prop_map(|(op, lhs, rhs)| ExpressionNode::binary(op, lhs, rhs)),
            (identifier(), proptest::collection::vec(inner, 0..3))
                .prop_map(|(name, args)| ExpressionNode::call(name, args)),
        ]
    })
}

proptest! {
    #[test]
    fn printed_tree_parses_back(tree in expression()) {
        let printed = tree.to_string();
        let reparsed = parse(&printed);
        prop_assert_eq!(reparsed, Ok(tree), "printed as {}", printed);
    }

    #[test]
    fn printing_is_stable(tree in expression()) {
        let once = tree.to_string();
        let twice = parse(&once).unwrap().to_string();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn parser_never_panics(text in "[ -~]{0,40}") {
        let _ = parse(&text);
    }

    #[test]
    fn integer_comparisons_match_rust(a in any::<i64>(), b in any::<i64>()) {
        let bindings = HashMap::from([
            ("a".to_string(), Value::Int(a)),
            ("b".to_string(), Value::Int(b)),
        ]);
        let tree = parse("a < b || a == b").unwrap();
        prop_assert_eq!(evaluate(&tree, &bindings), Ok(a <= b));
    }

    #[test]
    fn integer_addition_is_checked(a in any::<i64>(), b in any::<i64>()) {
        let bindings = HashMap::from([
            ("a".to_string(), Value::Int(a)),
            ("b".to_string(), Value::Int(b)),
        ]);
        let tree = parse("a + b > 0").unwrap();
        let expected = match a.checked_add(b) {
            Some(sum) => Ok(sum > 0),
            None => Err(PredicateError::ArithmeticOverflow { operator: "+" }),
        };
        prop_assert_eq!(evaluate(&tree, &bindings), expected);
    }
}
