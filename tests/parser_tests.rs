extern crate bfscriptlib;

use bfscriptlib::parser;

#[test]
fn parse_test1() {
    let src = "output(8);";
    let ast = parser::parse(src);
    assert!(ast.is_ok());
    assert_eq!("[Output(Number(8))]", format!("{:?}", ast.unwrap()));
}

#[test]
fn parse_rejects_garbage() {
    let src = "size_t = ;";
    assert!(parser::parse(src).is_err());
}

#[test]
fn parse_stack_methods() {
    // Stack syntax parses; rejection happens during lowering.
    let src = "stack s; s.push(1); size_t x = s.pop(); size_t y = s.peek();";
    let ast = parser::parse(src).unwrap();
    assert_eq!(ast.len(), 4);
}

#[test]
fn parse_comments_and_whitespace() {
    let src = "// leading comment\nsize_t x = 1; /* inline */ output(x);\n";
    let ast = parser::parse(src).unwrap();
    assert_eq!(ast.len(), 2);
}
