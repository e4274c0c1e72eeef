#[cfg(test)]
mod scanner_tests {
    use rox::error::LoxError;
    use rox::scanner::*;
    use rox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source);
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
    fn test_scanner_02_one_or_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >= /",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_sum_carries_number_literals() {
        let (tokens, errors) = scan_tokens("1 + 2");

        assert!(errors.is_empty());
        assert_eq!(tokens.len(), 4);

        assert!(matches!(tokens[0].token_type, TokenType::NUMBER(n) if n == 1.0));
        assert_eq!(tokens[1].token_type, TokenType::PLUS);
        assert!(matches!(tokens[2].token_type, TokenType::NUMBER(n) if n == 2.0));
        assert_eq!(tokens[3].token_type, TokenType::EOF);
    }

    #[test]
    fn test_scanner_04_comments_and_lines() {
        let (tokens, errors) = scan_tokens("// nothing here\nvar x; // trailing\n\nprint x;");

        assert!(errors.is_empty());

        let lines: Vec<(&str, usize)> = tokens
            .iter()
            .map(|t| (t.token_type.name(), t.line))
            .collect();

        assert_eq!(
            lines,
            vec![
                ("VAR", 2),
                ("IDENTIFIER", 2),
                ("SEMICOLON", 2),
                ("PRINT", 4),
                ("IDENTIFIER", 4),
                ("SEMICOLON", 4),
                ("EOF", 4),
            ]
        );
    }

    #[test]
    fn test_scanner_05_strings() {
        let (tokens, errors) = scan_tokens("\"hello\" \"two\nlines\" x");

        assert!(errors.is_empty());

        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "hello"),
            other => panic!("expected a string, got {:?}", other),
        }
        assert_eq!(tokens[0].lexeme, "\"hello\"");

        match &tokens[1].token_type {
            TokenType::STRING(s) => assert_eq!(s, "two\nlines"),
            other => panic!("expected a string, got {:?}", other),
        }

        // The identifier after a multi-line string sits on line 2.
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn test_scanner_06_unterminated_string() {
        let (tokens, errors) = scan_tokens("\"never closed");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error: Unterminated string.");

        assert!(tokens
            .iter()
            .all(|t| !matches!(t.token_type, TokenType::STRING(_))));
        assert_eq!(tokens.last().map(|t| t.token_type.name()), Some("EOF"));
    }

    #[test]
    fn test_scanner_07_numbers() {
        let (tokens, errors) = scan_tokens("123 3.14 5.");

        assert!(errors.is_empty());

        let kinds: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();

        assert_eq!(
            kinds,
            vec![
                "NUMBER 123 123.0",
                "NUMBER 3.14 3.14",
                "NUMBER 5 5.0",
                "DOT . null",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_scanner_08_keywords_versus_identifiers() {
        assert_token_sequence(
            "and andy _or class orchid fun this",
            &[
                (TokenType::AND, "and"),
                (TokenType::IDENTIFIER, "andy"),
                (TokenType::IDENTIFIER, "_or"),
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::FUN, "fun"),
                (TokenType::THIS, "this"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_09_token_display() {
        let (tokens, _) = scan_tokens("\"hi\" foo");

        assert_eq!(tokens[0].to_string(), "STRING \"hi\" hi");
        assert_eq!(tokens[1].to_string(), "IDENTIFIER foo null");
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source);

        // Collect all results (both tokens and errors)
        let results: Vec<_> = scanner.collect();

        // We expect this sequence:
        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        // Check valid tokens
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
                "[line 1] Error: Unexpected character: $",
                "[line 1] Error: Unexpected character: #",
            ]
        );

        // Helper function
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
    fn test_unexpected_multibyte_character_reports_once() {
        let (tokens, errors) = scan_tokens("a é b");

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Unexpected character: é"));
        assert_eq!(tokens.len(), 3);
    }
}
