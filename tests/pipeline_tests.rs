use anyhow::Result;
use chrono::NaiveDate;
use error_dsl::ast::{ConditionValue, DslObject, DslOperator, LogicalOperator};
use error_dsl::config::CompilerConfig;
use error_dsl::lexer::{PrecedenceLexer, SequentialLexer, Tokenizer, TokenizerKind};
use error_dsl::parser::Parser;
use error_dsl::payload::SqlType;
use error_dsl::sql_compiler::SqlGenerator;
use error_dsl::token::TokenKind;
use error_dsl::{Compiler, Error};
use sea_query::Value;

const SAMPLE: &str = "MATCH app = 'MyTestApp'
AND ex IN ('System.NullReferenceException', 'System.FormatException')
BETWEEN 2016-01-01 00:00:00 AND 2016-02-01 00:00:00
LIMIT 100";

const QUERIES: [&str; 5] = [
    SAMPLE,
    "MATCH fingerprint = '0123456789abcdef' BETWEEN 2016-01-01 00:00:00 AND 2016-01-02 00:00:00",
    "match msg like 'timeout' or sf not like 'Retry' and application not in ('A', 'B', 'C') between 2015-12-31 23:59:59 and 2016-01-01 00:00:00 limit 7",
    "MATCH exception != 'System.Exception' OR stackframe = 'Main' BETWEEN 2016-01-01 00:00:00 AND 2016-03-01 12:30:00",
    "MATCH message NOT IN ('a','b') AND fingerprint LIKE 'ff' BETWEEN 2016-01-01 00:00:00 AND 2016-02-01 00:00:00 LIMIT 0",
];

fn large_query() -> String {
    let mut query = String::from("MATCH app = 'MyTestApp'\n");
    for i in 0..40 {
        query.push_str(&format!(
            "AND sf = '{i}sadsdfsdfsdfsdfssdfjhsfjhsdfjhsdfjhsdfjhsdjfhsdjhfsdjfhsdhfsdjhfsdjhf'\n"
        ));
        query.push_str("AND ex IN ('System.NullReferenceException', 'System.FormatException')\n");
    }
    query.push_str("BETWEEN 2016-01-01 00:00:00 AND 2016-02-01 00:00:00\nLIMIT 100");
    query
}

#[test]
fn test_tokenizers_agree_on_well_formed_queries() {
    let large = large_query();
    for query in QUERIES.iter().copied().chain([large.as_str()]) {
        let sequential = SequentialLexer.tokenize(query);
        let precedence = PrecedenceLexer.tokenize(query);
        assert_eq!(sequential, precedence, "token mismatch for {query}");
        assert!(sequential.iter().all(|t| t.kind != TokenKind::Invalid));
    }
}

#[test]
fn test_sample_round_trip() -> Result<()> {
    for kind in [TokenizerKind::Sequential, TokenizerKind::Precedence] {
        let compiler = Compiler::from_config(CompilerConfig {
            tokenizer: kind,
            ..Default::default()
        });

        let query = compiler.parse(SAMPLE)?;
        assert_eq!(query.limit, Some(100));
        assert_eq!(query.match_conditions.len(), 2);
        assert_eq!(query.match_conditions[0].connector, Some(LogicalOperator::And));
        assert_eq!(query.match_conditions[1].connector, None);

        let payload = compiler.compile(SAMPLE)?;
        let sql = payload.sql();
        assert!(sql.starts_with("SELECT TOP 100\n"));
        assert!(sql.contains("WHERE T.ErrorDateTime BETWEEN @FromDate AND @ToDate\n"));
        assert!(sql.contains("AND ED.ApplicationId = @Param1\n"));
        assert!(sql.contains("AND EB.ExceptionType IN (@Param2,@Param3)\n"));
        assert!(sql.ends_with("ORDER BY TotalErrors DESC\n"));

        let parameters = payload.parameters();
        assert_eq!(parameters.len(), 5);
        assert_eq!(parameters[0].name, "@FromDate");
        assert_eq!(
            parameters[0].value,
            Value::from(NaiveDate::from_ymd_opt(2016, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap())
        );
        assert_eq!(parameters[2].name, "@Param1");
        assert_eq!(parameters[2].sql_type, SqlType::VarChar(200));
        assert_eq!(parameters[2].value, Value::from("MyTestApp".to_string()));
        assert_eq!(parameters[4].value, Value::from("System.FormatException".to_string()));
    }
    Ok(())
}

#[test]
fn test_parameter_count_matches_values() -> Result<()> {
    let compiler = Compiler::new();
    for query_text in QUERIES {
        let query = compiler.parse(query_text)?;
        let expected_values: usize = query
            .match_conditions
            .iter()
            .map(|c| match &c.value {
                ConditionValue::Single(_) => 1,
                ConditionValue::List(values) => values.len(),
            })
            .sum();

        let payload = SqlGenerator::new().generate(&query)?;
        let params: Vec<_> = payload.parameters().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(params.len(), expected_values + 2);
        assert_eq!(params.iter().filter(|n| **n == "@FromDate").count(), 1);
        assert_eq!(params.iter().filter(|n| **n == "@ToDate").count(), 1);
        for (i, name) in params.iter().skip(2).enumerate() {
            assert_eq!(*name, format!("@Param{}", i + 1));
        }
        assert_eq!(payload.values().0.len(), params.len());
    }
    Ok(())
}

#[test]
fn test_condition_count_and_order() -> Result<()> {
    let query = Compiler::new().parse(QUERIES[2])?;
    let shape: Vec<_> = query
        .match_conditions
        .iter()
        .map(|c| (c.object, c.operator, c.connector))
        .collect();
    assert_eq!(
        shape,
        vec![
            (DslObject::Message, DslOperator::Like, Some(LogicalOperator::Or)),
            (DslObject::StackFrame, DslOperator::NotLike, Some(LogicalOperator::And)),
            (DslObject::Application, DslOperator::NotIn, None),
        ]
    );
    Ok(())
}

#[test]
fn test_mixed_connectors_render_from_predecessor() -> Result<()> {
    let payload = Compiler::new().compile(QUERIES[2])?;
    let predicate: Vec<_> = payload
        .sql()
        .lines()
        .skip_while(|l| !l.starts_with("WHERE"))
        .skip(1)
        .take_while(|l| !l.starts_with("GROUP BY"))
        .collect();
    assert_eq!(
        predicate,
        vec![
            "AND T.MessageDetails LIKE '%' + @Param1 + '%'",
            "OR EB.StackFrame NOT LIKE '%' + @Param2 + '%'",
            "AND ED.ApplicationId NOT IN (@Param3,@Param4,@Param5)",
        ]
    );
    Ok(())
}

#[test]
fn test_large_query() -> Result<()> {
    let query = large_query();
    let sequential = Compiler::from_config(CompilerConfig {
        tokenizer: TokenizerKind::Sequential,
        ..Default::default()
    })
    .compile(&query)?;
    let precedence = Compiler::new().compile(&query)?;

    assert_eq!(sequential.sql(), precedence.sql());
    assert_eq!(sequential.parameters(), precedence.parameters());
    // 1 + 40 * (1 + 2) values plus the two dates.
    assert_eq!(precedence.parameters().len(), 123);
    Ok(())
}

#[test]
fn test_unknown_object_fails_without_partial_result() {
    let result = Compiler::with_tokenizer(Box::new(SequentialLexer))
        .compile("MATCH foo = 'x' BETWEEN 2016-01-01 00:00:00 AND 2016-02-01 00:00:00");
    match result {
        Err(Error::Syntax(e)) => {
            assert_eq!(e.found, "foo");
            assert!(e.to_string().contains("foo"));
        }
        other => panic!("Expected syntax error, got {other:?}"),
    }
}

#[test]
fn test_limit_abc_is_a_syntax_error() {
    for kind in [TokenizerKind::Sequential, TokenizerKind::Precedence] {
        let compiler = Compiler::with_tokenizer(kind.build());
        let err = compiler
            .parse("MATCH app = 'a' BETWEEN 2016-01-01 00:00:00 AND 2016-02-01 00:00:00 LIMIT abc")
            .unwrap_err();
        assert_eq!(err.expected, "an integer number");
    }
}

#[test]
fn test_reparsing_tokens_is_idempotent() -> Result<()> {
    let tokens = PrecedenceLexer.tokenize(QUERIES[3]);
    let first = Parser::new(&tokens).parse()?;
    let second = Parser::new(&tokens).parse()?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_query_model_serializes_to_json() -> Result<()> {
    let query = Compiler::new().parse(SAMPLE)?;
    let json = serde_json::to_value(&query)?;

    assert_eq!(json["limit"], 100);
    assert_eq!(json["date_range"]["from"], "2016-01-01T00:00:00");
    assert_eq!(json["match_conditions"][0]["object"], "Application");
    assert_eq!(json["match_conditions"][0]["value"]["Single"], "MyTestApp");
    assert_eq!(json["match_conditions"][1]["value"]["List"][1], "System.FormatException");
    assert!(json["match_conditions"][1]["connector"].is_null());
    Ok(())
}
