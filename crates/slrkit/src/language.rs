//! A small imperative language expressed as an SLR(1) grammar.
//!
//! The token kinds are the upper-case terminal names, e.g. `IDENT`,
//! `INT_LIT` or `ASSIGN`. A program is a sequence of function
//! declarations and `BEGIN ... END` blocks.

use crate::{error::Error, grammar::Grammar, recognizer::Recognizer};

pub const GRAMMAR: &[&str] = &[
    "Program -> Decls",
    "Decls -> Decl Decls | ε",
    "Decl -> FuncDecl | MainBlock",
    "MainBlock -> BEGIN Stmts END",
    "FuncDecl -> FUNCTION Type IDENT LPAREN Params RPAREN BEGIN Stmts END",
    "Params -> ParamList | ε",
    "ParamList -> Type IDENT | Type IDENT COMMA ParamList",
    "Stmts -> Stmt Stmts | ε",
    "Stmt -> VarDecl | Assign | If | While | For | Write | Read | Call | Return",
    "VarDecl -> Type IDENT | Type IDENT ASSIGN Expr",
    "Assign -> IDENT ASSIGN Expr",
    "If -> IF Expr BEGIN Stmts END | IF Expr BEGIN Stmts END ELSE BEGIN Stmts END",
    "While -> WHILE Expr DO BEGIN Stmts END",
    "For -> FOR Assign DO Expr DO Assign DO BEGIN Stmts END",
    "Write -> WRITE LPAREN Expr RPAREN",
    "Read -> READ LPAREN IDENT RPAREN",
    "Call -> IDENT LPAREN Args RPAREN",
    "Args -> ArgList | ε",
    "ArgList -> Expr | Expr COMMA ArgList",
    // A bare `RETURN` would be ambiguous with a following statement.
    "Return -> RETURN Expr",
    "Type -> INT | FLOAT | BOOL | STRING",
    "Expr -> Arith RelOp Arith | Arith",
    "RelOp -> GT | LT | GE | LE | EQ | NE",
    "Arith -> Arith PLUS Term | Arith MINUS Term | Term",
    "Term -> Term STAR Factor | Term SLASH Factor | Factor",
    "Factor -> INT_LIT | FLOAT_LIT | STRING_LIT | BOOL_LIT | IDENT | Call | LPAREN Expr RPAREN | MINUS Factor",
];

pub fn grammar() -> Result<Grammar, Error> {
    Ok(Grammar::from_rules(GRAMMAR)?)
}

pub fn recognizer() -> Result<Recognizer, Error> {
    Recognizer::new(grammar()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::ErrorKind, token::Token};
    use slrkit_runtime::Location;

    /// One token per whitespace separated kind; each line of `source` is a source line.
    fn tokens(source: &str) -> Vec<Token> {
        source
            .lines()
            .enumerate()
            .flat_map(|(line, text)| {
                text.split_whitespace()
                    .enumerate()
                    .map(move |(i, kind)| Token::new(kind, kind, line + 1, i + 1))
            })
            .collect()
    }

    #[test]
    fn grammar_is_slr1() {
        let r = recognizer().unwrap();
        assert!(r.conflicts().is_empty(), "{:?}", r.conflicts());
        assert_eq!(r.grammar().start_symbol, r.grammar().nonterminal("Program").unwrap());
    }

    #[test]
    fn every_nonterminal_has_follow() {
        let r = recognizer().unwrap();
        for (&n, nonterminal) in &r.grammar().nonterminals {
            assert!(!r.follow_sets().follow(n).is_empty(), "FOLLOW({})", nonterminal);
        }
    }

    #[test]
    fn accepts_program() {
        let r = recognizer().unwrap();
        r.recognize(tokens(
            "FUNCTION INT IDENT LPAREN INT IDENT COMMA FLOAT IDENT RPAREN BEGIN
               RETURN IDENT STAR INT_LIT
             END
             BEGIN
               INT IDENT ASSIGN INT_LIT
               STRING IDENT
               IDENT ASSIGN IDENT PLUS INT_LIT
               IF IDENT GT INT_LIT BEGIN
                 WRITE LPAREN IDENT RPAREN
               END ELSE BEGIN
                 READ LPAREN IDENT RPAREN
               END
               WHILE IDENT LT INT_LIT DO BEGIN
                 IDENT ASSIGN IDENT PLUS INT_LIT
               END
               FOR IDENT ASSIGN INT_LIT DO IDENT LE INT_LIT DO IDENT ASSIGN IDENT PLUS INT_LIT DO BEGIN
                 WRITE LPAREN MINUS IDENT SLASH LPAREN FLOAT_LIT MINUS IDENT RPAREN RPAREN
               END
               IDENT LPAREN IDENT COMMA IDENT LPAREN RPAREN RPAREN
             END",
        ))
        .unwrap();
    }

    #[test]
    fn accepts_empty_program() {
        let r = recognizer().unwrap();
        r.recognize(vec![]).unwrap();
        r.recognize(tokens("BEGIN END")).unwrap();
    }

    #[test]
    fn rejects_missing_end() {
        let r = recognizer().unwrap();
        let err = r
            .recognize(tokens("BEGIN\nIDENT ASSIGN INT_LIT\nWHILE IDENT DO BEGIN END"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_eq!(err.location(), Some(Location::new(3, 5)));
    }

    #[test]
    fn rejects_misplaced_token() {
        let r = recognizer().unwrap();
        let err = r
            .recognize(tokens("BEGIN\nIDENT ASSIGN PLUS INT_LIT\nEND"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_eq!(err.location(), Some(Location::new(2, 3)));
    }
}
