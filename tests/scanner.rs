#[cfg(test)]
mod scanner_tests {
    use pretty_assertions::assert_eq;

    use rox::error::LoxError;
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source, "test.lox");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_maximal_munch_operators() {
        assert_token_sequence(
            "!= == <= >= ! = < > /",
            &[
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::BANG, "!"),
                (TokenType::EQUAL, "="),
                (TokenType::LESS, "<"),
                (TokenType::GREATER, ">"),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "class Foo < Bar { break function fun _x1 }",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "Foo"),
                (TokenType::LESS, "<"),
                (TokenType::IDENTIFIER, "Bar"),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::BREAK, "break"),
                (TokenType::FUN, "function"),
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "_x1"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_numbers_do_not_swallow_trailing_dot() {
        let tokens: Vec<Token> = Scanner::new("123.45 12. .5", "test.lox")
            .filter_map(Result::ok)
            .collect();

        let rendered: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();

        assert_eq!(
            rendered,
            vec![
                "NUMBER 123.45 123.45",
                "NUMBER 12 12.0",
                "DOT . null",
                "DOT . null",
                "NUMBER 5 5.0",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_scanner_05_comments_and_multiline_strings() {
        let scanned = scan_tokens("// nothing here\n\"one\ntwo\" x", "test.lox");

        assert!(!scanned.had_error());
        assert_eq!(scanned.tokens.len(), 3);

        let string = &scanned.tokens[0];
        assert_eq!(string.token_type, TokenType::STRING(String::new()));
        assert_eq!(string.to_string(), "STRING \"one\ntwo\" one\ntwo");
        assert_eq!(string.line(), 2);

        let ident = &scanned.tokens[1];
        assert_eq!(ident.lexeme, "x");
        assert_eq!(ident.line(), 3);
        assert_eq!(ident.pos.column, 6);
    }

    #[test]
    fn test_scanner_06_columns_are_one_based() {
        let scanned = scan_tokens("var  answer = 42;", "test.lox");
        let columns: Vec<usize> = scanned.tokens.iter().map(|t| t.pos.column).collect();

        assert_eq!(columns, vec![1, 6, 13, 15, 17, 18]);
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let results: Vec<_> = Scanner::new(source, "test.lox").collect();

        // 0: COMMA, 1: DOT, 2: error '$', 3: LEFT_PAREN, 4: error '#', 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let errors: Vec<String> = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .map(|e| e.to_string())
            .collect();

        assert_eq!(
            errors,
            vec![
                "SCANNER ERROR [test.lox:1:3] Unexpected character '$'.\n,.$(#\n--^--",
                "SCANNER ERROR [test.lox:1:5] Unexpected character '#'.\n,.$(#\n----^",
            ]
        );

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_error_context_shows_neighbouring_lines() {
        let scanned = scan_tokens("var a = 1;\nvar b = @;\nprint b;", "test.lox");

        assert!(scanned.had_error());
        assert_eq!(scanned.errors.len(), 1);
        assert_eq!(
            scanned.errors[0].to_string(),
            "SCANNER ERROR [test.lox:2:9] Unexpected character '@'.\n\
             var a = 1;\n\
             var b = @;\n\
             --------^-\n\
             print b;"
        );

        // Scanning carried on past the bad character.
        let last = scanned.tokens.last().map(|t| t.token_type.clone());
        assert_eq!(last, Some(TokenType::EOF));
        assert!(scanned.tokens.iter().any(|t| t.lexeme == "print"));
    }

    #[test]
    fn test_unterminated_string_reports_and_continues() {
        let scanned = scan_tokens("print \"abc", "test.lox");

        assert_eq!(scanned.errors.len(), 1);
        let message = scanned.errors[0].to_string();
        assert!(
            message.starts_with("SCANNER ERROR [test.lox:1:7] Unterminated string."),
            "got: {}",
            message
        );

        let types: Vec<&'static str> = scanned.tokens.iter().map(|t| t.token_type.name()).collect();
        assert_eq!(types, vec!["PRINT", "EOF"]);
    }

    #[test]
    fn test_non_ascii_reported_once_per_character() {
        let scanned = scan_tokens("é", "test.lox");

        assert_eq!(scanned.errors.len(), 1);
        assert!(scanned.errors[0]
            .to_string()
            .contains("Unexpected character 'é'."));
        assert_eq!(scanned.tokens.len(), 1);
    }

    #[test]
    fn test_scanner_is_fused_after_eof() {
        let mut scanner = Scanner::new("", "test.lox");

        assert!(matches!(scanner.next(), Some(Ok(ref t)) if t.token_type == TokenType::EOF));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }
}
