// Precedence folding: compile a flat operand/operator capture into a tree
//
// The parser records each expression as a flat sequence of operands and
// operator symbols. This pass walks the sequence once per precedence tier
// (tightest first), reducing matched neighborhoods into unary or binary
// nodes. The tier table is data; adding an operator is a table edit.

use crate::error::{ErrorKind, SpannedError};
use crate::span::Span;

use super::ast::{BinOp, Expr, ExprKind, OpSym, RawExpr, RawItem, UnaryOp};

#[derive(Clone, Copy)]
enum Assoc {
    Left,
    Right,
}

#[derive(Clone, Copy)]
enum FoldOp {
    Unary(UnaryOp),
    Binary(BinOp),
    Assign,
}

/// Precedence tiers, tightest first. Tier 1 is the prefix-unary tier; the
/// last tier is assignment (right-associative).
const TIERS: &[(Assoc, &[(OpSym, FoldOp)])] = &[
    (
        Assoc::Right,
        &[
            (OpSym::Not, FoldOp::Unary(UnaryOp::LogNot)),
            (OpSym::BitNot, FoldOp::Unary(UnaryOp::BitNot)),
        ],
    ),
    (
        Assoc::Left,
        &[
            (OpSym::Mul, FoldOp::Binary(BinOp::Mul)),
            (OpSym::Div, FoldOp::Binary(BinOp::Div)),
            (OpSym::Mod, FoldOp::Binary(BinOp::Mod)),
        ],
    ),
    (
        Assoc::Left,
        &[
            (OpSym::Add, FoldOp::Binary(BinOp::Add)),
            (OpSym::Sub, FoldOp::Binary(BinOp::Sub)),
        ],
    ),
    (
        Assoc::Left,
        &[
            (OpSym::Shl, FoldOp::Binary(BinOp::Shl)),
            (OpSym::Shr, FoldOp::Binary(BinOp::Shr)),
        ],
    ),
    (
        Assoc::Left,
        &[
            (OpSym::Lt, FoldOp::Binary(BinOp::Lt)),
            (OpSym::Le, FoldOp::Binary(BinOp::Le)),
            (OpSym::Gt, FoldOp::Binary(BinOp::Gt)),
            (OpSym::Ge, FoldOp::Binary(BinOp::Ge)),
        ],
    ),
    (
        Assoc::Left,
        &[
            (OpSym::Eq, FoldOp::Binary(BinOp::Eq)),
            (OpSym::Ne, FoldOp::Binary(BinOp::Ne)),
        ],
    ),
    (Assoc::Left, &[(OpSym::BitAnd, FoldOp::Binary(BinOp::BitAnd))]),
    (Assoc::Left, &[(OpSym::BitXor, FoldOp::Binary(BinOp::BitXor))]),
    (Assoc::Left, &[(OpSym::BitOr, FoldOp::Binary(BinOp::BitOr))]),
    (Assoc::Left, &[(OpSym::LogAnd, FoldOp::Binary(BinOp::LogAnd))]),
    (Assoc::Left, &[(OpSym::LogOr, FoldOp::Binary(BinOp::LogOr))]),
    (Assoc::Right, &[(OpSym::Assign, FoldOp::Assign)]),
];

fn tier_op(tier: &[(OpSym, FoldOp)], sym: OpSym) -> Option<FoldOp> {
    tier.iter().find(|(s, _)| *s == sym).map(|(_, op)| *op)
}

/// Fold a raw capture into a precedence-correct expression tree.
pub fn fold(raw: RawExpr) -> Result<Expr, SpannedError> {
    let span = raw.span;
    let mut items = raw.items;

    for (assoc, tier) in TIERS {
        match assoc {
            Assoc::Right => fold_right(&mut items, tier)?,
            Assoc::Left => fold_left(&mut items, tier)?,
        }
    }

    match (items.len(), items.pop()) {
        (1, Some(RawItem::Operand(expr))) => Ok(expr),
        _ => Err(SpannedError::new(
            ErrorKind::Parse,
            "malformed expression",
            span,
        )),
    }
}

/// One left-to-right pass reducing `operand OP operand` neighborhoods.
/// Re-checking the same index after a reduction keeps left associativity.
fn fold_left(items: &mut Vec<RawItem>, tier: &[(OpSym, FoldOp)]) -> Result<(), SpannedError> {
    let mut i = 0;
    while i < items.len() {
        let op = match &items[i] {
            RawItem::Op(sym, _) => tier_op(tier, *sym),
            RawItem::Operand(_) => None,
        };
        let Some(op) = op else {
            i += 1;
            continue;
        };
        let op_span = match &items[i] {
            RawItem::Op(_, s) => *s,
            RawItem::Operand(_) => unreachable!(),
        };
        let lhs_ok = i > 0 && matches!(items[i - 1], RawItem::Operand(_));
        let rhs_ok = i + 1 < items.len() && matches!(items[i + 1], RawItem::Operand(_));
        if !lhs_ok || !rhs_ok {
            return Err(SpannedError::new(
                ErrorKind::Parse,
                "operator is missing an operand",
                op_span,
            ));
        }
        let rhs = match items.remove(i + 1) {
            RawItem::Operand(e) => e,
            RawItem::Op(..) => unreachable!(),
        };
        items.remove(i); // the operator
        let lhs = match items.remove(i - 1) {
            RawItem::Operand(e) => e,
            RawItem::Op(..) => unreachable!(),
        };
        let reduced = reduce(op, lhs, rhs, op_span)?;
        items.insert(i - 1, RawItem::Operand(reduced));
        // The reduced operand sits at i - 1; the next candidate operator
        // is at i, which the loop re-checks without advancing.
    }
    Ok(())
}

/// One right-to-left pass for right-associative tiers: prefix unaries and
/// assignment.
fn fold_right(items: &mut Vec<RawItem>, tier: &[(OpSym, FoldOp)]) -> Result<(), SpannedError> {
    let mut i = items.len();
    while i > 0 {
        i -= 1;
        let op = match &items[i] {
            RawItem::Op(sym, _) => tier_op(tier, *sym),
            RawItem::Operand(_) => None,
        };
        let Some(op) = op else {
            continue;
        };
        let op_span = match &items[i] {
            RawItem::Op(_, s) => *s,
            RawItem::Operand(_) => unreachable!(),
        };
        match op {
            FoldOp::Unary(unary) => {
                // Prefix position: no operand immediately to the left
                let prefix_pos = i == 0 || matches!(items[i - 1], RawItem::Op(..));
                let operand_ok = i + 1 < items.len() && matches!(items[i + 1], RawItem::Operand(_));
                if !prefix_pos || !operand_ok {
                    return Err(SpannedError::new(
                        ErrorKind::Parse,
                        "unary operator is missing its operand",
                        op_span,
                    ));
                }
                let operand = match items.remove(i + 1) {
                    RawItem::Operand(e) => e,
                    RawItem::Op(..) => unreachable!(),
                };
                items.remove(i);
                let span = op_span.merge(operand.span);
                items.insert(
                    i,
                    RawItem::Operand(Expr {
                        kind: ExprKind::Unary {
                            op: unary,
                            operand: Box::new(operand),
                        },
                        span,
                    }),
                );
            }
            FoldOp::Binary(_) | FoldOp::Assign => {
                let lhs_ok = i > 0 && matches!(items[i - 1], RawItem::Operand(_));
                let rhs_ok = i + 1 < items.len() && matches!(items[i + 1], RawItem::Operand(_));
                if !lhs_ok || !rhs_ok {
                    return Err(SpannedError::new(
                        ErrorKind::Parse,
                        "operator is missing an operand",
                        op_span,
                    ));
                }
                let rhs = match items.remove(i + 1) {
                    RawItem::Operand(e) => e,
                    RawItem::Op(..) => unreachable!(),
                };
                items.remove(i);
                let lhs = match items.remove(i - 1) {
                    RawItem::Operand(e) => e,
                    RawItem::Op(..) => unreachable!(),
                };
                let reduced = reduce(op, lhs, rhs, op_span)?;
                i -= 1;
                items.insert(i, RawItem::Operand(reduced));
            }
        }
    }
    Ok(())
}

fn reduce(op: FoldOp, lhs: Expr, rhs: Expr, op_span: Span) -> Result<Expr, SpannedError> {
    let span = lhs.span.merge(rhs.span);
    match op {
        FoldOp::Binary(bin) => Ok(Expr {
            kind: ExprKind::Binary {
                op: bin,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            span,
        }),
        FoldOp::Assign => {
            if !matches!(lhs.kind, ExprKind::Path(_)) {
                return Err(SpannedError::new(
                    ErrorKind::Parse,
                    "left side of assignment is not a variable reference",
                    op_span,
                ));
            }
            Ok(Expr {
                kind: ExprKind::Assign {
                    target: Box::new(lhs),
                    value: Box::new(rhs),
                },
                span,
            })
        }
        FoldOp::Unary(_) => unreachable!("unary ops are reduced in fold_right"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::StringInterner;
    use crate::parser::ast::PathExpr;

    fn int(v: i128) -> RawItem {
        RawItem::Operand(Expr {
            kind: ExprKind::IntLiteral(v),
            span: Span::dummy(),
        })
    }

    fn op(sym: OpSym) -> RawItem {
        RawItem::Op(sym, Span::dummy())
    }

    fn fold_items(items: Vec<RawItem>) -> Expr {
        fold(RawExpr {
            items,
            span: Span::dummy(),
        })
        .expect("fold failed")
    }

    #[test]
    fn test_single_operand() {
        let expr = fold_items(vec![int(42)]);
        assert!(matches!(expr.kind, ExprKind::IntLiteral(42)));
    }

    #[test]
    fn test_mul_binds_tighter_than_add() {
        // 1 + 2 * 3 => 1 + (2 * 3)
        let expr = fold_items(vec![int(1), op(OpSym::Add), int(2), op(OpSym::Mul), int(3)]);
        match expr.kind {
            ExprKind::Binary { op: BinOp::Add, rhs, .. } => match rhs.kind {
                ExprKind::Binary { op: BinOp::Mul, .. } => {}
                other => panic!("expected Mul on the right, got {:?}", other),
            },
            other => panic!("expected Add at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_left_associative_sub() {
        // 10 - 3 - 2 => (10 - 3) - 2
        let expr = fold_items(vec![int(10), op(OpSym::Sub), int(3), op(OpSym::Sub), int(2)]);
        match expr.kind {
            ExprKind::Binary { op: BinOp::Sub, lhs, rhs } => {
                assert!(matches!(lhs.kind, ExprKind::Binary { op: BinOp::Sub, .. }));
                assert!(matches!(rhs.kind, ExprKind::IntLiteral(2)));
            }
            other => panic!("expected Sub at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_comparison_binds_looser_than_shift() {
        // 1 << 2 < 3 => (1 << 2) < 3
        let expr = fold_items(vec![int(1), op(OpSym::Shl), int(2), op(OpSym::Lt), int(3)]);
        match expr.kind {
            ExprKind::Binary { op: BinOp::Lt, lhs, .. } => {
                assert!(matches!(lhs.kind, ExprKind::Binary { op: BinOp::Shl, .. }));
            }
            other => panic!("expected Lt at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_stacked_unary() {
        // ! ! 1 => !(!1)
        let expr = fold_items(vec![op(OpSym::Not), op(OpSym::Not), int(1)]);
        match expr.kind {
            ExprKind::Unary { op: UnaryOp::LogNot, operand } => {
                assert!(matches!(
                    operand.kind,
                    ExprKind::Unary { op: UnaryOp::LogNot, .. }
                ));
            }
            other => panic!("expected LogNot at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_unary_binds_tighter_than_binary() {
        // ~1 & 2 => (~1) & 2
        let expr = fold_items(vec![op(OpSym::BitNot), int(1), op(OpSym::BitAnd), int(2)]);
        match expr.kind {
            ExprKind::Binary { op: BinOp::BitAnd, lhs, .. } => {
                assert!(matches!(lhs.kind, ExprKind::Unary { op: UnaryOp::BitNot, .. }));
            }
            other => panic!("expected BitAnd at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_logical_or_loosest_before_assign() {
        // 1 && 2 || 3 => (1 && 2) || 3
        let expr = fold_items(vec![
            int(1),
            op(OpSym::LogAnd),
            int(2),
            op(OpSym::LogOr),
            int(3),
        ]);
        match expr.kind {
            ExprKind::Binary { op: BinOp::LogOr, lhs, .. } => {
                assert!(matches!(lhs.kind, ExprKind::Binary { op: BinOp::LogAnd, .. }));
            }
            other => panic!("expected LogOr at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_assignment_requires_path() {
        let err = fold(RawExpr {
            items: vec![int(1), op(OpSym::Assign), int(2)],
            span: Span::dummy(),
        })
        .unwrap_err();
        assert!(err.message.contains("not a variable reference"));
    }

    #[test]
    fn test_assignment_to_path() {
        let mut interner = StringInterner::new();
        let x = interner.intern("x");
        let path = RawItem::Operand(Expr {
            kind: ExprKind::Path(Box::new(PathExpr {
                head: x,
                segments: Vec::new(),
            })),
            span: Span::dummy(),
        });
        let expr = fold_items(vec![path, op(OpSym::Assign), int(2)]);
        assert!(matches!(expr.kind, ExprKind::Assign { .. }));
    }

    #[test]
    fn test_missing_operand_rejected() {
        let err = fold(RawExpr {
            items: vec![int(1), op(OpSym::Add)],
            span: Span::dummy(),
        })
        .unwrap_err();
        assert!(err.message.contains("missing an operand"));
    }
}
