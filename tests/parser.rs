#[cfg(test)]
mod parser_tests {
    use pretty_assertions::assert_eq;

    use rox::ast::{Expr, Stmt};
    use rox::ast_printer::AstPrinter;
    use rox::parser::{Parsed, Parser};
    use rox::scanner::scan_tokens;

    fn parse(source: &str) -> Parsed {
        let scanned = scan_tokens(source, "test.lox");
        assert!(!scanned.had_error(), "scan failed: {:?}", scanned.errors);
        Parser::new(&scanned.tokens).parse()
    }

    fn print(source: &str) -> String {
        let parsed = parse(source);
        assert!(!parsed.had_error(), "parse failed: {:?}", parsed.errors);
        AstPrinter::print_program(&parsed.statements)
    }

    fn errors(source: &str) -> Vec<String> {
        parse(source).errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_parser_01_precedence() {
        assert_eq!(print("print 1 + 2 * 3;"), "(print (+ 1.0 (* 2.0 3.0)))");
        assert_eq!(print("print (1 + 2) * 3;"), "(print (* (group (+ 1.0 2.0)) 3.0))");
        assert_eq!(print("print -a == !b;"), "(print (== (- a) (! b)))");
        assert_eq!(
            print("print a or b and c;"),
            "(print (or a (and b c)))"
        );
        assert_eq!(print("print 1 < 2 == true;"), "(print (== (< 1.0 2.0) true))");
    }

    #[test]
    fn test_parser_02_assignment_is_right_associative() {
        assert_eq!(print("a = b = 3;"), "(; (= a (= b 3.0)))");
        assert_eq!(print("obj.x = 1.5;"), "(; (= (. obj x) 1.5))");
    }

    #[test]
    fn test_parser_03_declarations() {
        assert_eq!(print("var x = \"hi\";\nvar y;"), "(var x hi)\n(var y)");
        assert_eq!(
            print("fun add(a, b) { return a + b; }"),
            "(fun add (a b) (return (+ a b)))"
        );
        assert_eq!(
            print("function noop() {}"),
            "(fun noop ())"
        );
        assert_eq!(
            print("class B < A { init(x) { this.x = x; } get() { return super.get(); } }"),
            "(class B < A (fun init (x) (; (= (. this x) x))) (fun get () (return (call (super get)))))"
        );
    }

    #[test]
    fn test_parser_04_for_desugars_to_while() {
        assert_eq!(
            print("for (var i = 0; i < 3; i = i + 1) print i;"),
            "(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"
        );
        assert_eq!(print("for (;;) break;"), "(while true (break))");
    }

    #[test]
    fn test_parser_05_if_else_and_calls() {
        assert_eq!(
            print("if (a) print f(1, 2)(3); else { g(); }"),
            "(if a (print (call (call f 1.0 2.0) 3.0)) (block (; (call g))))"
        );
    }

    #[test]
    fn test_parser_06_missing_semicolon() {
        assert_eq!(
            errors("print 1"),
            vec!["PARSER ERROR [test.lox:1:8] at end: Expect ';' after value."]
        );
    }

    #[test]
    fn test_parser_07_recovers_and_reports_every_error() {
        let parsed = parse("var = 1;\nprint 2;\nprint );\nprint 3;");

        let messages: Vec<String> = parsed.errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "PARSER ERROR [test.lox:1:5] at '=': Expect variable name.",
                "PARSER ERROR [test.lox:3:7] at ')': Expect expression.",
            ]
        );

        // The good statements still parsed.
        assert_eq!(
            AstPrinter::print_program(&parsed.statements),
            "(print 2.0)\n(print 3.0)"
        );
    }

    #[test]
    fn test_parser_08_invalid_assignment_target() {
        assert_eq!(
            errors("a + b = c;"),
            vec!["PARSER ERROR [test.lox:1:7] at '=': Invalid assignment target."]
        );
    }

    #[test]
    fn test_parser_09_super_requires_dot() {
        assert_eq!(
            errors("class A < B { m() { super; } }"),
            vec!["PARSER ERROR [test.lox:1:26] at ';': Expect '.' after 'super'."]
        );
    }

    #[test]
    fn test_parser_10_too_many_arguments() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        let errors = errors(&source);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].ends_with("Can't have more than 255 arguments."));
    }

    #[test]
    fn test_parser_11_too_many_parameters() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let source = format!("fun f({}) {{}}", params.join(", "));

        let parsed = parse(&source);
        assert_eq!(parsed.errors.len(), 1);
        assert!(parsed.errors[0]
            .to_string()
            .ends_with("Can't have more than 255 parameters."));
        // Reported without abandoning the declaration.
        assert_eq!(parsed.statements.len(), 1);
    }

    #[test]
    fn test_parser_12_binding_nodes_get_distinct_ids() {
        let parsed = parse("a; a;");

        let ids: Vec<_> = parsed
            .statements
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Expression(Expr::Variable { id, .. }) => Some(*id),
                _ => None,
            })
            .collect();

        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_parser_13_empty_token_slice() {
        let parsed = Parser::new(&[]).parse();

        assert!(parsed.statements.is_empty());
        assert_eq!(
            parsed.errors.iter().map(|e| e.to_string()).collect::<Vec<_>>(),
            vec!["PARSER ERROR [<input>:1:1] at end: Expect end of input."]
        );
    }

    #[test]
    fn test_parser_14_tokens_without_eof() {
        let mut tokens = scan_tokens("print 1;", "test.lox").tokens;
        tokens.pop();

        let parsed = Parser::new(&tokens).parse();

        assert!(parsed.had_error());
        assert!(parsed.statements.is_empty());
        assert_eq!(
            parsed.errors[0].to_string(),
            "PARSER ERROR [test.lox:1:8] at end: Expect end of input."
        );
    }
}
