mod common;

#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;

    use rox::error::LoxError;
    use rox::interpreter::Interpreter;
    use rox::parser::Parser;
    use rox::resolver::Resolver;
    use rox::scanner::scan_tokens;

    use crate::common::run;

    fn resolve(source: &str) -> Result<(), LoxError> {
        let scanned = scan_tokens(source, "test.lox");
        let parsed = Parser::new(&scanned.tokens).parse();
        assert!(!parsed.had_error(), "parse failed: {:?}", parsed.errors);

        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter).resolve(&parsed.statements)
    }

    fn resolve_error(source: &str) -> String {
        match resolve(source) {
            Ok(()) => panic!("expected a resolver error for: {}", source),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn test_resolver_01_accepts_valid_program() {
        let source = "
            var a = 1;
            fun outer() {
                var b = a;
                fun inner() { return b; }
                return inner;
            }
            class A { init() { this.x = 1; } }
            class B < A { init() { super.init(); return; } }
            while (true) { if (a) break; }
        ";

        assert!(resolve(source).is_ok());
    }

    #[test]
    fn test_resolver_02_redeclaration_in_local_scope() {
        assert_eq!(
            resolve_error("{ var a = 1; var a = 2; }"),
            "RUNTIME ERROR [test.lox:1:18] Variable 'a' is already declared in this scope."
        );
    }

    #[test]
    fn test_resolver_03_global_redeclaration_is_allowed() {
        assert!(resolve("var a = 1; var a = 2;").is_ok());
    }

    #[test]
    fn test_resolver_04_read_in_own_initializer() {
        assert_eq!(
            resolve_error("var a = 1; { var a = a; }"),
            "RUNTIME ERROR [test.lox:1:22] Can't read local variable in its own initializer."
        );
    }

    #[test]
    fn test_resolver_05_top_level_return() {
        assert_eq!(
            resolve_error("return 1;"),
            "RUNTIME ERROR [test.lox:1:1] Can't return from top-level code."
        );
    }

    #[test]
    fn test_resolver_06_return_value_from_initializer() {
        assert!(resolve_error("class A { init() { return 1; } }")
            .ends_with("Can't return a value from an initializer."));
    }

    #[test]
    fn test_resolver_07_break_outside_loop() {
        assert!(resolve_error("break;").ends_with("Can't use 'break' outside of a loop."));

        // A function body does not inherit the loop around its declaration.
        assert!(resolve_error("while (true) { fun f() { break; } }")
            .ends_with("Can't use 'break' outside of a loop."));
    }

    #[test]
    fn test_resolver_08_this_and_super_placement() {
        assert!(resolve_error("print this;").ends_with("Can't use 'this' outside of a class."));
        assert!(resolve_error("fun f() { return this; }")
            .ends_with("Can't use 'this' outside of a class."));
        assert!(resolve_error("print super.x;")
            .ends_with("Can't use 'super' outside of a class."));
        assert!(resolve_error("class A { m() { super.m(); } }")
            .ends_with("Can't use 'super' in a class with no superclass."));
    }

    #[test]
    fn test_resolver_09_self_inheritance() {
        assert_eq!(
            resolve_error("class A < A {}"),
            "RUNTIME ERROR [test.lox:1:11] A class can't inherit from itself."
        );
    }

    #[test]
    fn test_resolver_10_errors_prevent_execution() {
        let outcome = run("print \"before\"; return;");

        assert_eq!(outcome.output, "");
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].exit_code(), 65);
    }

    #[test]
    fn test_resolver_11_closure_binds_lexically() {
        let outcome = run("
            var a = \"global\";
            {
                fun show() { print a; }
                show();
                var a = \"block\";
                show();
            }
        ");

        assert!(outcome.errors.is_empty(), "{}", outcome.error_text());
        assert_eq!(outcome.output, "global\nglobal\n");
    }
}
