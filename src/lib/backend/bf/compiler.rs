use errors::CompileError;
use parser::{BinOp, Expr, Stmt, TypeName, UnOp};

use super::instructions::BfIns;
use super::ir::{IrOp, TransferDest};
use super::memory::TapePlanner;

/// Accumulates primitives for one compilation, tracking the pointer's
/// compile-time position so IR operations can address cells absolutely.
///
/// `LoopBegin`/`LoopEnd` both park the pointer on the keyed cell before
/// emitting their bracket, so every runtime entry into a loop body sees
/// the pointer where the body's first instruction expects it.
#[derive(Debug)]
pub struct TapeBlock {
    pub instructions: Vec<BfIns>,
    cursor: usize,
}

impl TapeBlock {
    pub fn new() -> TapeBlock {
        TapeBlock {
            instructions: vec![],
            cursor: 0,
        }
    }

    pub fn into_instructions(self) -> Vec<BfIns> {
        self.instructions
    }

    fn emit(&mut self, ins: BfIns) {
        self.instructions.push(ins);
    }

    fn emit_repeat(&mut self, ins: BfIns, count: usize) {
        for _ in 0..count {
            self.instructions.push(ins);
        }
    }

    fn move_to(&mut self, cell: usize) {
        if cell > self.cursor {
            self.emit_repeat(BfIns::MoveRight, cell - self.cursor);
        } else {
            self.emit_repeat(BfIns::MoveLeft, self.cursor - cell);
        }
        self.cursor = cell;
    }

    pub fn ir(&mut self, op: IrOp) {
        match op {
            IrOp::Set { dst, value } => {
                self.ir(IrOp::Clear { dst });
                self.ir(IrOp::Add { dst, amount: value });
            }
            IrOp::Clear { dst } => {
                self.move_to(dst);
                self.emit(BfIns::LoopStart);
                self.emit(BfIns::Dec);
                self.emit(BfIns::LoopEnd);
            }
            IrOp::Add { dst, amount } => {
                self.move_to(dst);
                if amount >= 0 {
                    self.emit_repeat(BfIns::Inc, amount as usize);
                } else {
                    self.emit_repeat(BfIns::Dec, amount.unsigned_abs() as usize);
                }
            }
            IrOp::Transfer { src, dsts } => {
                self.move_to(src);
                self.emit(BfIns::LoopStart);
                self.emit(BfIns::Dec);
                for dst in &dsts {
                    self.move_to(dst.cell);
                    self.emit(if dst.negate { BfIns::Dec } else { BfIns::Inc });
                }
                self.move_to(src);
                self.emit(BfIns::LoopEnd);
            }
            IrOp::CopyPreserving { src, dst, tmp } => {
                self.ir(IrOp::Transfer {
                    src,
                    dsts: vec![TransferDest::add(dst), TransferDest::add(tmp)],
                });
                self.ir(IrOp::Transfer {
                    src: tmp,
                    dsts: vec![TransferDest::add(src)],
                });
            }
            IrOp::SaturatingSub { x, y, tmp } => {
                // For each unit of y, take one unit off x unless x has
                // already reached zero. The guarded step is: stash x in
                // tmp, and only when the stash is non-empty consume one
                // unit before restoring the remainder.
                self.move_to(y);
                self.emit(BfIns::LoopStart);
                self.emit(BfIns::Dec);
                self.ir(IrOp::Transfer {
                    src: x,
                    dsts: vec![TransferDest::add(tmp)],
                });
                self.move_to(tmp);
                self.emit(BfIns::LoopStart);
                self.emit(BfIns::Dec);
                self.ir(IrOp::Transfer {
                    src: tmp,
                    dsts: vec![TransferDest::add(x)],
                });
                self.emit(BfIns::LoopEnd);
                self.move_to(y);
                self.emit(BfIns::LoopEnd);
            }
            IrOp::BoolFromNonzero { src, dst } => {
                self.move_to(src);
                self.emit(BfIns::LoopStart);
                self.move_to(dst);
                self.emit(BfIns::Inc);
                self.ir(IrOp::Clear { dst: src });
                self.emit(BfIns::LoopEnd);
            }
            IrOp::BoolFromZero { src, dst } => {
                self.move_to(dst);
                self.emit(BfIns::Inc);
                self.move_to(src);
                self.emit(BfIns::LoopStart);
                self.move_to(dst);
                self.emit(BfIns::Dec);
                self.ir(IrOp::Clear { dst: src });
                self.emit(BfIns::LoopEnd);
            }
            IrOp::ClearIfNonzero { src, flag } => {
                self.move_to(src);
                self.emit(BfIns::LoopStart);
                self.ir(IrOp::Clear { dst: flag });
                self.ir(IrOp::Clear { dst: src });
                self.emit(BfIns::LoopEnd);
            }
            IrOp::LoopBegin { cell } => {
                self.move_to(cell);
                self.emit(BfIns::LoopStart);
            }
            IrOp::LoopEnd { cell } => {
                self.move_to(cell);
                self.emit(BfIns::LoopEnd);
            }
            IrOp::Output { cell } => {
                self.move_to(cell);
                self.emit(BfIns::Output);
            }
            IrOp::Input { cell } => {
                self.move_to(cell);
                self.emit(BfIns::Input);
            }
            IrOp::Seek { cell } => {
                self.move_to(cell);
            }
        }
    }
}

/// Lowers a parsed program to the primitive instruction sequence.
/// Pure: the same AST always yields the same sequence, and nothing is
/// emitted for a program containing a rejected construct.
pub fn compile_program(program: &[Stmt]) -> Result<Vec<BfIns>, CompileError> {
    let mut planner = TapePlanner::new();
    let mut block = TapeBlock::new();
    for stmt in program {
        compile_stmt(&mut planner, &mut block, stmt)?;
    }
    Ok(block.into_instructions())
}

fn compile_stmt(
    planner: &mut TapePlanner,
    block: &mut TapeBlock,
    stmt: &Stmt,
) -> Result<(), CompileError> {
    match stmt {
        Stmt::VarDecl { ty, name, init } => {
            if *ty == TypeName::Void {
                return Err(CompileError::TypeMismatch(format!(
                    "variable '{}' cannot have type void; a value-bearing type is required",
                    name
                )));
            }
            let cell = planner.declare(name)?;
            match init {
                Some(expr) => assign_into(planner, block, cell, expr)?,
                // Declarations without an initializer read as zero: the
                // cell is fresh, or was cleared when its previous scope
                // exited.
                None => block.ir(IrOp::Seek { cell }),
            }
            Ok(())
        }
        Stmt::Assign { name, expr } => {
            let cell = planner.resolve(name)?;
            assign_into(planner, block, cell, expr)
        }
        Stmt::If {
            cond,
            then_body,
            else_body,
        } => {
            let guard = planner.claim_scratch();
            compile_expr(planner, block, cond, guard)?;
            match else_body {
                None => {
                    block.ir(IrOp::LoopBegin { cell: guard });
                    compile_stmt(planner, block, then_body)?;
                    // The guard is forced to zero so the bracket runs
                    // the body at most once.
                    block.ir(IrOp::Clear { dst: guard });
                    block.ir(IrOp::LoopEnd { cell: guard });
                }
                Some(els) => {
                    let flag = planner.claim_scratch();
                    block.ir(IrOp::Set { dst: flag, value: 1 });
                    block.ir(IrOp::LoopBegin { cell: guard });
                    compile_stmt(planner, block, then_body)?;
                    block.ir(IrOp::Add {
                        dst: flag,
                        amount: -1,
                    });
                    block.ir(IrOp::Clear { dst: guard });
                    block.ir(IrOp::LoopEnd { cell: guard });
                    block.ir(IrOp::LoopBegin { cell: flag });
                    compile_stmt(planner, block, els)?;
                    block.ir(IrOp::Add {
                        dst: flag,
                        amount: -1,
                    });
                    block.ir(IrOp::LoopEnd { cell: flag });
                    planner.release_scratch(flag);
                }
            }
            planner.release_scratch(guard);
            Ok(())
        }
        Stmt::While { cond, body } => {
            let guard = planner.claim_scratch();
            compile_expr(planner, block, cond, guard)?;
            block.ir(IrOp::LoopBegin { cell: guard });
            compile_stmt(planner, block, body)?;
            // Re-evaluate the condition at the end of every iteration;
            // expression lowering clears the guard before writing it.
            compile_expr(planner, block, cond, guard)?;
            block.ir(IrOp::LoopEnd { cell: guard });
            planner.release_scratch(guard);
            Ok(())
        }
        Stmt::Block(stmts) => {
            planner.enter_scope();
            for inner in stmts {
                compile_stmt(planner, block, inner)?;
            }
            for cell in planner.exit_scope() {
                block.ir(IrOp::Clear { dst: cell });
            }
            Ok(())
        }
        Stmt::Output(expr) => {
            // A plain variable read is non-destructive, so it is
            // emitted in place without a copy.
            if let Expr::Ident(name) = expr {
                let cell = planner.resolve(name)?;
                block.ir(IrOp::Output { cell });
                return Ok(());
            }
            let scratch = planner.claim_scratch();
            compile_expr(planner, block, expr, scratch)?;
            block.ir(IrOp::Output { cell: scratch });
            block.ir(IrOp::Clear { dst: scratch });
            planner.release_scratch(scratch);
            Ok(())
        }
        Stmt::Return { expr } => {
            // There are no functions to return from; the operand is
            // still evaluated for its effects (e.g. input()).
            if let Some(expr) = expr {
                discard_expr(planner, block, expr)?;
            }
            Ok(())
        }
        Stmt::ExprStmt(expr) => discard_expr(planner, block, expr),
        Stmt::StackDecl { name } => Err(CompileError::UnsupportedFeature(format!(
            "stack declaration of '{}': the stack type is not supported",
            name
        ))),
        Stmt::Push { stack, .. } => Err(CompileError::UnsupportedFeature(format!(
            "'{}.push(...)': the stack type is not supported",
            stack
        ))),
    }
}

/// Evaluates `expr` into a scratch cell, clears the destination, and
/// transfers the result over, leaving the pointer parked on the
/// destination. Staging through scratch keeps self-references like
/// `x = x + 1` correct.
fn assign_into(
    planner: &mut TapePlanner,
    block: &mut TapeBlock,
    cell: usize,
    expr: &Expr,
) -> Result<(), CompileError> {
    let scratch = planner.claim_scratch();
    compile_expr(planner, block, expr, scratch)?;
    block.ir(IrOp::Clear { dst: cell });
    block.ir(IrOp::Transfer {
        src: scratch,
        dsts: vec![TransferDest::add(cell)],
    });
    planner.release_scratch(scratch);
    block.ir(IrOp::Seek { cell });
    Ok(())
}

/// Evaluates an expression purely for its side effects.
fn discard_expr(
    planner: &mut TapePlanner,
    block: &mut TapeBlock,
    expr: &Expr,
) -> Result<(), CompileError> {
    let scratch = planner.claim_scratch();
    compile_expr(planner, block, expr, scratch)?;
    block.ir(IrOp::Clear { dst: scratch });
    planner.release_scratch(scratch);
    Ok(())
}

/// Emits code leaving the value of `expr` in `dst` and the pointer
/// parked there. `dst` may hold anything on entry; every path clears it
/// (or overwrites it, for input) before producing the value.
fn compile_expr(
    planner: &mut TapePlanner,
    block: &mut TapeBlock,
    expr: &Expr,
    dst: usize,
) -> Result<usize, CompileError> {
    if let Some(value) = fold_expr(expr)? {
        block.ir(IrOp::Set { dst, value });
        return Ok(dst);
    }

    match expr {
        Expr::Number(n) => block.ir(IrOp::Set { dst, value: *n }),
        Expr::Char(c) => block.ir(IrOp::Set {
            dst,
            value: *c as i64,
        }),
        Expr::Ident(name) => {
            let var = planner.resolve(name)?;
            block.ir(IrOp::Clear { dst });
            let tmp = planner.claim_scratch();
            block.ir(IrOp::CopyPreserving { src: var, dst, tmp });
            planner.release_scratch(tmp);
        }
        Expr::Input => block.ir(IrOp::Input { cell: dst }),
        Expr::Unary {
            op: UnOp::Neg,
            operand,
        } => {
            // 0 - value, i.e. modular negation at the machine's width.
            block.ir(IrOp::Clear { dst });
            let scratch = planner.claim_scratch();
            compile_expr(planner, block, operand, scratch)?;
            block.ir(IrOp::Transfer {
                src: scratch,
                dsts: vec![TransferDest::sub(dst)],
            });
            planner.release_scratch(scratch);
        }
        Expr::Unary {
            op: UnOp::Not,
            operand,
        } => {
            let scratch = planner.claim_scratch();
            compile_expr(planner, block, operand, scratch)?;
            block.ir(IrOp::Clear { dst });
            block.ir(IrOp::BoolFromZero { src: scratch, dst });
            planner.release_scratch(scratch);
        }
        Expr::Binary { op, lhs, rhs } => match op {
            BinOp::Add | BinOp::Sub => {
                compile_expr(planner, block, lhs, dst)?;
                let scratch = planner.claim_scratch();
                compile_expr(planner, block, rhs, scratch)?;
                let dest = if *op == BinOp::Add {
                    TransferDest::add(dst)
                } else {
                    TransferDest::sub(dst)
                };
                block.ir(IrOp::Transfer {
                    src: scratch,
                    dsts: vec![dest],
                });
                planner.release_scratch(scratch);
            }
            BinOp::Mul => {
                return Err(CompileError::UnsupportedOperation(
                    "multiplication needs both operands constant; \
                     runtime multiplication is not lowered"
                        .to_string(),
                ));
            }
            BinOp::Div => {
                return Err(CompileError::UnsupportedOperation(
                    "division needs both operands constant; \
                     runtime division is not lowered"
                        .to_string(),
                ));
            }
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                compile_comparison(planner, block, *op, lhs, rhs, dst)?;
            }
        },
        Expr::Call { name, .. } => {
            return Err(CompileError::UnsupportedFeature(format!(
                "call to '{}': user-defined functions are not supported",
                name
            )));
        }
        Expr::StackPop { stack } => {
            return Err(CompileError::UnsupportedFeature(format!(
                "'{}.pop()': the stack type is not supported",
                stack
            )));
        }
        Expr::StackPeek { stack } => {
            return Err(CompileError::UnsupportedFeature(format!(
                "'{}.peek()': the stack type is not supported",
                stack
            )));
        }
    }

    block.ir(IrOp::Seek { cell: dst });
    Ok(dst)
}

/// Lowers a comparison to a 0/1 value in `dst`. Both operands are
/// materialized, then reduced with saturating subtraction: which
/// operand is subtracted from which, and whether zero or non-zero wins,
/// is what distinguishes the operators. Saturation keeps every loop
/// bounded by the operands' magnitudes at any cell width.
fn compile_comparison(
    planner: &mut TapePlanner,
    block: &mut TapeBlock,
    op: BinOp,
    lhs: &Expr,
    rhs: &Expr,
    dst: usize,
) -> Result<(), CompileError> {
    let a = planner.claim_scratch();
    let b = planner.claim_scratch();
    compile_expr(planner, block, lhs, a)?;
    compile_expr(planner, block, rhs, b)?;
    let tmp = planner.claim_scratch();

    match op {
        BinOp::Lt => {
            block.ir(IrOp::SaturatingSub { x: b, y: a, tmp });
            block.ir(IrOp::Clear { dst });
            block.ir(IrOp::BoolFromNonzero { src: b, dst });
        }
        BinOp::Gt => {
            block.ir(IrOp::SaturatingSub { x: a, y: b, tmp });
            block.ir(IrOp::Clear { dst });
            block.ir(IrOp::BoolFromNonzero { src: a, dst });
        }
        BinOp::Le => {
            block.ir(IrOp::SaturatingSub { x: a, y: b, tmp });
            block.ir(IrOp::Clear { dst });
            block.ir(IrOp::BoolFromZero { src: a, dst });
        }
        BinOp::Ge => {
            block.ir(IrOp::SaturatingSub { x: b, y: a, tmp });
            block.ir(IrOp::Clear { dst });
            block.ir(IrOp::BoolFromZero { src: b, dst });
        }
        BinOp::Eq | BinOp::Ne => {
            // Equality needs both differences, so the operands are
            // duplicated before the subtractions consume them.
            let a2 = planner.claim_scratch();
            let b2 = planner.claim_scratch();
            block.ir(IrOp::CopyPreserving { src: a, dst: a2, tmp });
            block.ir(IrOp::CopyPreserving { src: b, dst: b2, tmp });
            block.ir(IrOp::SaturatingSub { x: a, y: b2, tmp });
            block.ir(IrOp::SaturatingSub { x: b, y: a2, tmp });
            if op == BinOp::Eq {
                block.ir(IrOp::Set { dst, value: 1 });
                block.ir(IrOp::ClearIfNonzero { src: a, flag: dst });
                block.ir(IrOp::ClearIfNonzero { src: b, flag: dst });
            } else {
                // At most one difference is non-zero, so the two
                // contributions never sum past 1.
                block.ir(IrOp::Clear { dst });
                block.ir(IrOp::BoolFromNonzero { src: a, dst });
                block.ir(IrOp::BoolFromNonzero { src: b, dst });
            }
            planner.release_scratch(b2);
            planner.release_scratch(a2);
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
            unreachable!("not a comparison operator: {:?}", op)
        }
    }

    planner.release_scratch(tmp);
    planner.release_scratch(b);
    planner.release_scratch(a);
    Ok(())
}

/// Compile-time evaluation of literal-only expressions. Returns
/// `Ok(None)` when any operand is runtime-dependent; errors only for
/// constants no program could mean (division by zero, i64 overflow).
fn fold_expr(expr: &Expr) -> Result<Option<i64>, CompileError> {
    match expr {
        Expr::Number(n) => Ok(Some(*n)),
        Expr::Char(c) => Ok(Some(*c as i64)),
        Expr::Unary { op, operand } => {
            let value = match fold_expr(operand)? {
                Some(v) => v,
                None => return Ok(None),
            };
            match op {
                UnOp::Neg => Ok(Some(-value)),
                UnOp::Not => Ok(Some(if value == 0 { 1 } else { 0 })),
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let (l, r) = match (fold_expr(lhs)?, fold_expr(rhs)?) {
                (Some(l), Some(r)) => (l, r),
                _ => return Ok(None),
            };
            let overflow =
                || CompileError::UnsupportedOperation("constant expression overflows".to_string());
            match op {
                BinOp::Add => l.checked_add(r).map(Some).ok_or_else(overflow),
                BinOp::Sub => l.checked_sub(r).map(Some).ok_or_else(overflow),
                BinOp::Mul => l.checked_mul(r).map(Some).ok_or_else(overflow),
                BinOp::Div => {
                    if r == 0 {
                        Err(CompileError::UnsupportedOperation(
                            "division by zero in constant expression".to_string(),
                        ))
                    } else {
                        Ok(Some(l / r))
                    }
                }
                BinOp::Eq => Ok(Some((l == r) as i64)),
                BinOp::Ne => Ok(Some((l != r) as i64)),
                BinOp::Lt => Ok(Some((l < r) as i64)),
                BinOp::Le => Ok(Some((l <= r) as i64)),
                BinOp::Gt => Ok(Some((l > r) as i64)),
                BinOp::Ge => Ok(Some((l >= r) as i64)),
            }
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
fn render(block: &TapeBlock) -> String {
    block.instructions.iter().map(|i| i.symbol()).collect()
}

#[test]
fn set_emits_clear_then_increments_test() {
    let mut block = TapeBlock::new();
    block.ir(IrOp::Set { dst: 0, value: 3 });
    assert_eq!(render(&block), "[-]+++");
}

#[test]
fn transfer_is_the_classic_move_loop_test() {
    let mut block = TapeBlock::new();
    block.ir(IrOp::Transfer {
        src: 0,
        dsts: vec![TransferDest::add(1)],
    });
    assert_eq!(render(&block), "[->+<]");
}

#[test]
fn copy_preserving_stages_through_tmp_test() {
    let mut block = TapeBlock::new();
    block.ir(IrOp::CopyPreserving {
        src: 0,
        dst: 1,
        tmp: 2,
    });
    assert_eq!(render(&block), "[->+>+<<]>>[-<<+>>]");
}

#[test]
fn bool_from_zero_is_the_not_idiom_test() {
    let mut block = TapeBlock::new();
    block.ir(IrOp::BoolFromZero { src: 0, dst: 1 });
    assert_eq!(render(&block), ">+<[>-<[-]]");
}

#[test]
fn generated_brackets_balance_test() {
    let ast = ::parser::parse(
        "size_t a = 3; size_t b = 5; if (a < b) { output('y'); } else { output('n'); }",
    )
    .unwrap();
    let instructions = compile_program(&ast).unwrap();
    let mut depth: i64 = 0;
    for ins in &instructions {
        match ins {
            BfIns::LoopStart => depth += 1,
            BfIns::LoopEnd => {
                depth -= 1;
                assert!(depth >= 0, "loop end without a matching start");
            }
            _ => {}
        }
    }
    assert_eq!(depth, 0);
}

#[test]
fn rejects_runtime_multiplication_test() {
    let ast = ::parser::parse("size_t a = 2; size_t b = 3; size_t c = a * b;").unwrap();
    let err = compile_program(&ast).unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedOperation(_)));
}

#[test]
fn folds_literal_multiplication_test() {
    let ast = ::parser::parse("size_t c = 2 * 3;").unwrap();
    assert!(compile_program(&ast).is_ok());
}
