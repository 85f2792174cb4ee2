#[cfg(test)]
mod scanner_tests {
    use rlox::scanner::Scanner;
    use rlox::token::{Token, TokenType};

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn symbols() {
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
    fn one_and_two_char_operators() {
        assert_token_sequence(
            "! != = == < <= > >= / ? :",
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
                (TokenType::QUESTION, "?"),
                (TokenType::COLON, ":"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn comments_and_whitespace() {
        let scanner = Scanner::new(b"// nothing to see\n\t +");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token_type, TokenType::PLUS);
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[1].token_type, TokenType::EOF);
    }

    #[test]
    fn string_literal_payload() {
        let scanner = Scanner::new(b"\"hello world\"");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens[0].lexeme, "\"hello world\"");
        match &tokens[0].token_type {
            TokenType::STRING(literal) => assert_eq!(literal, "hello world"),
            other => panic!("expected string token, got {:?}", other),
        }
    }

    #[test]
    fn multiline_string_reports_opening_line() {
        let scanner = Scanner::new(b"\"one\ntwo\" +");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        // the string token belongs to the line of its opening quote
        assert_eq!(tokens[0].token_type, TokenType::STRING(String::new()));
        assert_eq!(tokens[0].line, 1);

        // the newline inside the string still advances the line counter
        assert_eq!(tokens[1].token_type, TokenType::PLUS);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn number_literals() {
        let scanner = Scanner::new(b"123 123.456 123. .5");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        let kinds: Vec<_> = tokens.iter().map(|t| t.token_type.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenType::NUMBER(0.0),
                TokenType::NUMBER(0.0),
                // the dot is only part of the number when a digit follows
                TokenType::NUMBER(0.0),
                TokenType::DOT,
                TokenType::DOT,
                TokenType::NUMBER(0.0),
                TokenType::EOF,
            ]
        );

        match tokens[1].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 123.456),
            _ => unreachable!(),
        }
        assert_eq!(tokens[2].lexeme, "123");
        assert_eq!(tokens[5].lexeme, "5");
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_token_sequence(
            "class classy and android nil _nil",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::IDENTIFIER, "classy"),
                (TokenType::AND, "and"),
                (TokenType::IDENTIFIER, "android"),
                (TokenType::NIL, "nil"),
                (TokenType::IDENTIFIER, "_nil"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn unexpected_chars_interleave_with_tokens() {
        let source = ",.$(#";
        let scanner = Scanner::new(source.as_bytes());

        let results: Vec<_> = scanner.collect();

        // 2 valid tokens, an error, a valid token, an error, EOF
        assert_eq!(results.len(), 6);

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2);

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "unexpected message: {}",
                err
            );
        }

        let token_at = |i: usize| -> &Token {
            match &results[i] {
                Ok(token) => token,
                Err(e) => panic!("expected token at {}, got error: {}", i, e),
            }
        };

        assert_eq!(token_at(0).token_type, TokenType::COMMA);
        assert_eq!(token_at(1).token_type, TokenType::DOT);
        assert_eq!(token_at(3).token_type, TokenType::LEFT_PAREN);
        assert_eq!(token_at(5).token_type, TokenType::EOF);
    }

    #[test]
    fn unterminated_string() {
        let scanner = Scanner::new(b"\"left open");
        let results: Vec<_> = scanner.collect();

        let err = results[0].as_ref().expect_err("should fail");
        assert!(err.to_string().contains("Unterminated string."));

        // the sentinel still closes the stream
        assert_eq!(results[1].as_ref().unwrap().token_type, TokenType::EOF);
    }

    #[test]
    fn lexeme_round_trip() {
        let source = "var alpha = 10;\nprint alpha + 2.5;\n// note\nwhile (true) beta = beta / 4;";
        let scanner = Scanner::new(source.as_bytes());

        for token in scanner.filter_map(Result::ok) {
            if token.token_type == TokenType::EOF {
                continue;
            }

            assert!(source.contains(&token.lexeme));

            let line = source
                .lines()
                .nth(token.line - 1)
                .unwrap_or_else(|| panic!("no line {} for {:?}", token.line, token));
            assert!(
                line.contains(&token.lexeme),
                "lexeme '{}' not on line {}",
                token.lexeme,
                token.line
            );
        }
    }
}
