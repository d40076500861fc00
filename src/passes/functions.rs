//! Function application: rewrites `FUNCTION` nodes into their
//! concrete effect before any other pass sees the tree.

use crate::ast::{ExprKind, FuncArg, MusicExpr};
use crate::error::{CompileError, Result};

/// Walks the tree post-order, rewriting every `FUNCTION` node in
/// place. Returns on the first error; siblings that were already
/// rewritten stay rewritten (their owning root is about to be
/// discarded by the caller anyway on failure).
pub fn apply(expr: &mut MusicExpr) -> Result<()> {
    for child in expr.children_mut() {
        apply(child)?;
    }

    if let ExprKind::Function { name, args } = &expr.kind {
        let name = name.clone();
        let args = args.clone();
        apply_function(expr, &name, &args)?;
    }

    Ok(())
}

fn apply_function(expr: &mut MusicExpr, name: &str, args: &[FuncArg]) -> Result<()> {
    match name {
        "tempo" => apply_tempo(expr, args),
        "volume" => apply_volume(expr),
        other => Err(CompileError::semantic(
            format!("function '{other}' is not defined"),
            expr.textloc,
        )),
    }
}

fn apply_tempo(expr: &mut MusicExpr, args: &[FuncArg]) -> Result<()> {
    if args.len() != 1 {
        return Err(CompileError::semantic(
            "wrong number of arguments to tempo function",
            expr.textloc,
        ));
    }

    let bpm: f32 = args[0].value.parse().map_err(|_| {
        CompileError::semantic(
            format!("invalid argument for tempo: {}", args[0].value),
            args[0].textloc,
        )
    })?;

    if !(bpm >= 1.0 && bpm.is_finite()) {
        return Err(CompileError::semantic(
            format!("invalid argument for tempo: {}", args[0].value),
            args[0].textloc,
        ));
    }

    expr.replace_kind(ExprKind::TempoChange { bpm });
    Ok(())
}

/// `volume(...)` is accepted but, as upstream, simply erases its
/// arguments and becomes a no-op. See the design notes for why this
/// placeholder behavior is kept rather than replaced with a guess.
fn apply_volume(expr: &mut MusicExpr) -> Result<()> {
    expr.replace_kind(ExprKind::Empty);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::textloc::Textloc;

    fn arg(value: &str) -> FuncArg {
        FuncArg {
            value: value.to_string(),
            textloc: Textloc::zero(),
        }
    }

    fn function(name: &str, args: Vec<FuncArg>) -> MusicExpr {
        MusicExpr::new(
            1,
            Textloc::zero(),
            ExprKind::Function {
                name: name.to_string(),
                args,
            },
        )
    }

    #[test]
    fn tempo_rewrites_to_tempochange() {
        let mut expr = function("tempo", vec![arg("120")]);
        apply(&mut expr).unwrap();
        match expr.kind {
            ExprKind::TempoChange { bpm } => assert_eq!(bpm, 120.0),
            _ => panic!("expected TempoChange"),
        }
    }

    #[test]
    fn tempo_rejects_wrong_argument_count() {
        let mut expr = function("tempo", vec![arg("120"), arg("90")]);
        assert!(apply(&mut expr).is_err());
    }

    #[test]
    fn tempo_rejects_non_positive_bpm() {
        let mut expr = function("tempo", vec![arg("0")]);
        assert!(apply(&mut expr).is_err());
    }

    #[test]
    fn volume_erases_to_empty() {
        let mut expr = function("volume", vec![arg("64")]);
        apply(&mut expr).unwrap();
        assert!(expr.is_empty_node());
    }

    #[test]
    fn unknown_function_is_an_error() {
        let mut expr = function("reverb", vec![]);
        let err = apply(&mut expr).unwrap_err();
        assert!(matches!(err, CompileError::Semantic { .. }));
    }
}
