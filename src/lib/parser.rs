use std::fmt;

use errors::CompileError;
use pest::Parser;

#[derive(Parser)]
#[grammar = "bfscript.pest"]
pub struct BfsParser;

/// Declared type of a variable. Only scalar integer types carry a value;
/// `void` is rejected during lowering when it reaches a value position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
    SizeT,
    Int,
    Char,
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(i64),
    Char(u8),
    Ident(String),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Input,
    StackPop {
        stack: String,
    },
    StackPeek {
        stack: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDecl {
        ty: TypeName,
        name: String,
        init: Option<Expr>,
    },
    StackDecl {
        name: String,
    },
    Assign {
        name: String,
        expr: Expr,
    },
    If {
        cond: Expr,
        then_body: Box<Stmt>,
        else_body: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    Return {
        expr: Option<Expr>,
    },
    Block(Vec<Stmt>),
    Output(Expr),
    Push {
        stack: String,
        arg: Expr,
    },
    ExprStmt(Expr),
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let _ = write!(f, "{:?}", self);
        Ok(())
    }
}

pub fn parse(source: &str) -> Result<Vec<Stmt>, CompileError> {
    let mut program = vec![];

    let pairs = BfsParser::parse(Rule::program, source)
        .map_err(|e| CompileError::Syntax(format!("{}", e)))?;
    for pair in pairs {
        if pair.as_rule() == Rule::program {
            for inner in pair.into_inner() {
                match inner.as_rule() {
                    Rule::statement => program.push(build_stmt(inner)?),
                    Rule::EOI => {}
                    unknown => unreachable!("unexpected rule under program: {:?}", unknown),
                }
            }
        }
    }

    Ok(program)
}

/// Keyword rules produce empty marker pairs; the walk skips them.
fn is_keyword(rule: Rule) -> bool {
    match rule {
        Rule::kwIf
        | Rule::kwElse
        | Rule::kwWhile
        | Rule::kwReturn
        | Rule::kwOutput
        | Rule::kwInput
        | Rule::kwStack => true,
        _ => false,
    }
}

fn build_stmt(pair: pest::iterators::Pair<Rule>) -> Result<Stmt, CompileError> {
    let inner = pair.into_inner().next().expect("statement has one child");
    match inner.as_rule() {
        Rule::block => {
            let stmts = inner
                .into_inner()
                .map(build_stmt)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Stmt::Block(stmts))
        }
        Rule::ifStatement => {
            let mut parts = inner.into_inner().filter(|p| !is_keyword(p.as_rule()));
            let cond = build_expr(parts.next().expect("if condition"))?;
            let then_body = build_stmt(parts.next().expect("if body"))?;
            let else_body = match parts.next() {
                Some(p) => Some(Box::new(build_stmt(p)?)),
                None => None,
            };
            Ok(Stmt::If {
                cond,
                then_body: Box::new(then_body),
                else_body,
            })
        }
        Rule::whileStatement => {
            let mut parts = inner.into_inner().filter(|p| !is_keyword(p.as_rule()));
            let cond = build_expr(parts.next().expect("while condition"))?;
            let body = build_stmt(parts.next().expect("while body"))?;
            Ok(Stmt::While {
                cond,
                body: Box::new(body),
            })
        }
        Rule::returnStatement => {
            let expr = match inner
                .into_inner()
                .find(|p| !is_keyword(p.as_rule()))
            {
                Some(p) => Some(build_expr(p)?),
                None => None,
            };
            Ok(Stmt::Return { expr })
        }
        Rule::outputStatement => {
            let operand = inner
                .into_inner()
                .find(|p| !is_keyword(p.as_rule()))
                .expect("output operand");
            Ok(Stmt::Output(build_expr(operand)?))
        }
        Rule::stackDeclaration => {
            let name = inner
                .into_inner()
                .find(|p| !is_keyword(p.as_rule()))
                .expect("stack name")
                .as_str();
            Ok(Stmt::StackDecl {
                name: name.to_string(),
            })
        }
        Rule::varDeclaration => {
            let mut parts = inner.into_inner();
            let ty = build_type_name(parts.next().expect("type name").as_str());
            let name = parts.next().expect("variable name").as_str().to_string();
            let init = match parts.next() {
                Some(p) => Some(build_expr(p)?),
                None => None,
            };
            Ok(Stmt::VarDecl { ty, name, init })
        }
        Rule::pushStatement => {
            let mut parts = inner.into_inner();
            let stack = parts.next().expect("stack name").as_str().to_string();
            let arg = build_expr(parts.next().expect("push argument"))?;
            Ok(Stmt::Push { stack, arg })
        }
        Rule::assignment => {
            let mut parts = inner.into_inner();
            let name = parts.next().expect("assignment target").as_str().to_string();
            let expr = build_expr(parts.next().expect("assignment value"))?;
            Ok(Stmt::Assign { name, expr })
        }
        Rule::exprStatement => {
            let expr = build_expr(inner.into_inner().next().expect("expression"))?;
            Ok(Stmt::ExprStmt(expr))
        }
        unknown => unreachable!("unexpected statement rule: {:?}", unknown),
    }
}

fn build_type_name(text: &str) -> TypeName {
    match text {
        "size_t" => TypeName::SizeT,
        "int" => TypeName::Int,
        "char" => TypeName::Char,
        "void" => TypeName::Void,
        unknown => unreachable!("unexpected type name: {}", unknown),
    }
}

fn build_expr(pair: pest::iterators::Pair<Rule>) -> Result<Expr, CompileError> {
    match pair.as_rule() {
        Rule::expr => build_expr(pair.into_inner().next().expect("expr has one child")),
        Rule::comparison => {
            let mut parts = pair.into_inner();
            let lhs = build_expr(parts.next().expect("comparison lhs"))?;
            match parts.next() {
                None => Ok(lhs),
                Some(op_pair) => {
                    let op = build_comparison_op(op_pair.as_str());
                    let rhs = build_expr(parts.next().expect("comparison rhs"))?;
                    Ok(Expr::Binary {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    })
                }
            }
        }
        Rule::arithmetic | Rule::term => {
            let mut parts = pair.into_inner();
            let mut node = build_expr(parts.next().expect("leading operand"))?;
            while let Some(op_pair) = parts.next() {
                let op = match op_pair.as_str() {
                    "+" => BinOp::Add,
                    "-" => BinOp::Sub,
                    "*" => BinOp::Mul,
                    "/" => BinOp::Div,
                    unknown => unreachable!("unexpected arithmetic operator: {}", unknown),
                };
                let rhs = build_expr(parts.next().expect("trailing operand"))?;
                node = Expr::Binary {
                    op,
                    lhs: Box::new(node),
                    rhs: Box::new(rhs),
                };
            }
            Ok(node)
        }
        Rule::unary => {
            let mut parts = pair.into_inner();
            let first = parts.next().expect("unary has a child");
            match first.as_rule() {
                Rule::negOp | Rule::notOp => {
                    let op = if first.as_rule() == Rule::negOp {
                        UnOp::Neg
                    } else {
                        UnOp::Not
                    };
                    let operand = build_expr(parts.next().expect("unary operand"))?;
                    Ok(Expr::Unary {
                        op,
                        operand: Box::new(operand),
                    })
                }
                _ => build_expr(first),
            }
        }
        Rule::atom => build_expr(pair.into_inner().next().expect("atom has one child")),
        Rule::inputCall => Ok(Expr::Input),
        Rule::popCall => {
            let stack = pair.into_inner().next().expect("stack name").as_str();
            Ok(Expr::StackPop {
                stack: stack.to_string(),
            })
        }
        Rule::peekCall => {
            let stack = pair.into_inner().next().expect("stack name").as_str();
            Ok(Expr::StackPeek {
                stack: stack.to_string(),
            })
        }
        Rule::functionCall => {
            let mut parts = pair.into_inner();
            let name = parts.next().expect("function name").as_str().to_string();
            let args = match parts.next() {
                Some(arg_list) => arg_list
                    .into_inner()
                    .map(build_expr)
                    .collect::<Result<Vec<_>, _>>()?,
                None => vec![],
            };
            Ok(Expr::Call { name, args })
        }
        Rule::number => {
            let text = pair.as_str().trim();
            text.parse::<i64>().map(Expr::Number).map_err(|_| {
                CompileError::Syntax(format!("integer literal '{}' is too large", text))
            })
        }
        Rule::charLiteral => build_char_literal(pair.as_str()).map(Expr::Char),
        Rule::ident => Ok(Expr::Ident(pair.as_str().to_string())),
        unknown => unreachable!("unexpected expression rule: {:?}", unknown),
    }
}

fn build_comparison_op(text: &str) -> BinOp {
    match text {
        "==" => BinOp::Eq,
        "!=" => BinOp::Ne,
        "<=" => BinOp::Le,
        ">=" => BinOp::Ge,
        "<" => BinOp::Lt,
        ">" => BinOp::Gt,
        unknown => unreachable!("unexpected comparison operator: {}", unknown),
    }
}

/// Decodes the single character (or escape) between the quotes of a
/// character literal into its byte value.
fn build_char_literal(text: &str) -> Result<u8, CompileError> {
    let body = &text[1..text.len() - 1];
    let mut chars = body.chars();
    match chars.next() {
        Some('\\') => match chars.next() {
            Some('n') => Ok(b'\n'),
            Some('t') => Ok(b'\t'),
            Some('r') => Ok(b'\r'),
            Some('0') => Ok(0),
            Some('\\') => Ok(b'\\'),
            Some('\'') => Ok(b'\''),
            Some('"') => Ok(b'"'),
            Some(other) => Err(CompileError::Syntax(format!(
                "unsupported escape sequence '\\{}'",
                other
            ))),
            None => unreachable!("escape without a character"),
        },
        Some(c) if (c as u32) < 256 => Ok(c as u8),
        Some(c) => Err(CompileError::Syntax(format!(
            "character literal '{}' does not fit in a byte",
            c
        ))),
        None => unreachable!("empty character literal"),
    }
}

#[test]
fn parse_output_statement_test() {
    let ast = parse("output('H');").unwrap();
    assert_eq!("[Output(Char(72))]", format!("{:?}", ast));
}

#[test]
fn parse_precedence_test() {
    // Multiplication binds tighter than addition, comparison loosest.
    let ast = parse("size_t x = 1 + 2 * 3 < 9;").unwrap();
    assert_eq!(ast.len(), 1);
    match &ast[0] {
        Stmt::VarDecl {
            init: Some(Expr::Binary { op: BinOp::Lt, lhs, .. }),
            ..
        } => match &**lhs {
            Expr::Binary { op: BinOp::Add, rhs, .. } => match &**rhs {
                Expr::Binary { op: BinOp::Mul, .. } => {}
                other => panic!("expected multiplication under addition, got {:?}", other),
            },
            other => panic!("expected addition under comparison, got {:?}", other),
        },
        other => panic!("unexpected parse: {:?}", other),
    }
}

#[test]
fn parse_keyword_prefix_ident_test() {
    // "ifx" must parse as an identifier, not the "if" keyword.
    let ast = parse("size_t ifx = 1; ifx = 2;").unwrap();
    assert_eq!(ast.len(), 2);
}
