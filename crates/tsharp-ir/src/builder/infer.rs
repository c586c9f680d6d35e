//! The closed typing rules: literal kinds, the operator table, first-order
//! type-argument inference and overload compatibility tiers.

use crate::ir::IrBinaryOp;
use std::collections::HashMap;
use std::sync::Arc;
use tsharp_catalog::convert::{
    ASYNC_GENERATOR, DICTIONARY, ENUMERABLE, GENERATOR, HASH_SET, TASK, TASK_OF,
};
use tsharp_catalog::{IrType, PrimitiveKind, TypeId};

const LIST: &str = "System.Collections.Generic.List`1";
const ASYNC_ENUMERABLE: &str = "System.Collections.Generic.IAsyncEnumerable`1";
const KEY_VALUE_PAIR: &str = "System.Collections.Generic.KeyValuePair`2";

/// Numeric kind a literal takes under an expected type.
pub(crate) fn literal_kind(expected: Option<&IrType>) -> PrimitiveKind {
    match expected.map(IrType::non_null) {
        Some(IrType::Primitive(kind)) if kind.is_numeric() => kind,
        _ => PrimitiveKind::Number,
    }
}

/// Whether numeric literal text denotes a non-integral value.
pub(crate) fn is_fractional(raw: &str) -> bool {
    let text = raw.replace('_', "");
    let lower = text.to_ascii_lowercase();
    if lower.starts_with("0x") || lower.starts_with("0b") || lower.starts_with("0o") {
        return false;
    }
    text.parse::<f64>().is_ok_and(|v| v.fract() != 0.0)
}

/// Type of `value`, widened the way a mutable binding sees it.
pub(crate) fn widen(ty: &IrType) -> IrType {
    match ty {
        IrType::Union(members) => {
            let widened: Vec<IrType> = members.iter().map(IrType::widen_literal).collect();
            IrType::union(widened)
        }
        IrType::Primitive(PrimitiveKind::Undefined) | IrType::Primitive(PrimitiveKind::Null) => {
            IrType::Unknown
        }
        other => other.widen_literal(),
    }
}

pub(crate) fn binary_result(op: IrBinaryOp, left: &IrType, right: &IrType) -> IrType {
    use IrBinaryOp::*;
    match op {
        Eq | NotEq | Lt | Le | Gt | Ge => IrType::boolean(),
        And | Or => {
            if left.is_primitive(PrimitiveKind::Boolean) && right.is_primitive(PrimitiveKind::Boolean) {
                IrType::boolean()
            } else {
                IrType::join(&widen(left), &widen(right))
            }
        }
        Coalesce => IrType::join(&widen(&left.non_null()), &widen(right)),
        BitAnd | BitOr | BitXor | Shl | Shr | UShr => IrType::Primitive(PrimitiveKind::Int),
        Add if left.is_stringish() || right.is_stringish() => IrType::string(),
        Add | Sub | Mul | Div | Mod => arithmetic(left, right),
    }
}

fn arithmetic(left: &IrType, right: &IrType) -> IrType {
    match (left.widen_literal(), right.widen_literal()) {
        (IrType::Primitive(a), IrType::Primitive(b)) if a.is_numeric() && b.is_numeric() => {
            IrType::Primitive(a.arithmetic_result(b))
        }
        (IrType::Any, _) | (_, IrType::Any) => IrType::Any,
        _ => IrType::number(),
    }
}

/// Join of several branch types, widened; `None` when there are none.
pub(crate) fn join_all(types: impl IntoIterator<Item = IrType>) -> Option<IrType> {
    types
        .into_iter()
        .map(|t| if t.is_nullish() { t } else { widen(&t) })
        .reduce(|acc, t| IrType::join(&acc, &t))
}

/// Element type seen by `for..of` and spreads.
pub(crate) fn element_type(ty: &IrType) -> IrType {
    match ty {
        IrType::Array(elem) => (**elem).clone(),
        IrType::Tuple { elements, rest } => {
            let mut all: Vec<IrType> = elements.clone();
            all.extend(rest.iter().map(|r| (**r).clone()));
            all.iter()
                .skip(1)
                .fold(all.first().cloned().unwrap_or(IrType::Unknown), |acc, t| IrType::join(&acc, t))
        }
        IrType::Primitive(PrimitiveKind::String) => IrType::Primitive(PrimitiveKind::Char),
        IrType::Dictionary { key, value } => IrType::Reference {
            id: platform_id(KEY_VALUE_PAIR),
            args: vec![(**key).clone(), (**value).clone()],
        },
        IrType::Reference { id, args } => match id.platform_name.as_ref() {
            DICTIONARY => IrType::Reference {
                id: platform_id(KEY_VALUE_PAIR),
                args: args.clone(),
            },
            LIST | HASH_SET | ENUMERABLE | ASYNC_ENUMERABLE | GENERATOR | ASYNC_GENERATOR => {
                args.first().cloned().unwrap_or(IrType::Unknown)
            }
            _ => IrType::Unknown,
        },
        IrType::Any => IrType::Any,
        _ => IrType::Unknown,
    }
}

/// Result of `await`: the task's result type.
pub(crate) fn awaited(ty: &IrType) -> IrType {
    match ty {
        IrType::Reference { id, args } if id.platform_name.as_ref() == TASK_OF => {
            args.first().cloned().unwrap_or(IrType::Unknown)
        }
        IrType::Reference { id, .. } if id.platform_name.as_ref() == TASK => IrType::void(),
        other => other.clone(),
    }
}

/// `Task` or `Task<T>` wrapping a function result.
pub(crate) fn task_of(ty: IrType) -> IrType {
    if ty.is_void() {
        IrType::reference(platform_id(TASK))
    } else {
        IrType::Reference {
            id: platform_id(TASK_OF),
            args: vec![ty],
        }
    }
}

/// `(yield, return, next)` of a generator interface type.
pub(crate) fn generator_parts(ty: &IrType) -> Option<(IrType, IrType, IrType, bool)> {
    match ty {
        IrType::Reference { id, args } if args.len() == 3 => {
            let is_async = match id.platform_name.as_ref() {
                GENERATOR => false,
                ASYNC_GENERATOR => true,
                _ => return None,
            };
            Some((args[0].clone(), args[1].clone(), args[2].clone(), is_async))
        }
        _ => None,
    }
}

pub(crate) fn generator_type(yield_ty: IrType, return_ty: IrType, next_ty: IrType, is_async: bool) -> IrType {
    let name = if is_async { ASYNC_GENERATOR } else { GENERATOR };
    IrType::Reference {
        id: platform_id(name),
        args: vec![yield_ty, return_ty, next_ty],
    }
}

pub(crate) fn platform_id(platform_name: &str) -> TypeId {
    let tail = platform_name
        .rsplit_once('.')
        .map(|(_, tail)| tail)
        .unwrap_or(platform_name);
    TypeId::new(tsharp_catalog::type_id::strip_arity(tail), platform_name)
}

/// First-order unification of a parameter type against an argument type,
/// binding the listed type parameters.
pub(crate) fn unify(
    param: &IrType,
    arg: &IrType,
    type_params: &[String],
    map: &mut HashMap<Arc<str>, IrType>,
) {
    match (param, arg) {
        (IrType::TypeParameter(name), _) if type_params.iter().any(|p| **p == **name) => {
            if matches!(arg, IrType::Unknown) {
                return;
            }
            map.entry(name.clone()).or_insert_with(|| widen(arg));
        }
        (IrType::Array(p), IrType::Array(a)) => unify(p, a, type_params, map),
        (IrType::Array(p), IrType::Tuple { .. }) => unify(p, &element_type(arg), type_params, map),
        (IrType::Reference { id: pid, args: pargs }, IrType::Reference { id: aid, args: aargs })
            if pid == aid =>
        {
            for (p, a) in pargs.iter().zip(aargs) {
                unify(p, a, type_params, map);
            }
        }
        // IEnumerable<T> accepts arrays and the generic collections.
        (IrType::Reference { id, args: pargs }, _)
            if id.platform_name.as_ref() == ENUMERABLE && pargs.len() == 1 =>
        {
            let elem = element_type(arg);
            if !elem.is_unknown() {
                unify(&pargs[0], &elem, type_params, map);
            }
        }
        (IrType::Dictionary { key: pk, value: pv }, IrType::Dictionary { key: ak, value: av }) => {
            unify(pk, ak, type_params, map);
            unify(pv, av, type_params, map);
        }
        (IrType::Function(p), IrType::Function(a)) => {
            for (pp, ap) in p.params.iter().zip(&a.params) {
                unify(&pp.ty, &ap.ty, type_params, map);
            }
            unify(&p.ret, &a.ret, type_params, map);
        }
        (IrType::Union(members), _) => {
            // `T | null` against a non-null argument binds `T`.
            let open: Vec<&IrType> = members.iter().filter(|m| !m.is_nullish()).collect();
            if let [single] = open.as_slice() {
                unify(single, &arg.non_null(), type_params, map);
            }
        }
        (IrType::Tuple { elements: pe, .. }, IrType::Tuple { elements: ae, .. }) => {
            for (p, a) in pe.iter().zip(ae) {
                unify(p, a, type_params, map);
            }
        }
        _ => {}
    }
}

/// How well an argument of type `arg` fits a parameter of type `param`:
/// `0` exact, `1` implicit numeric widening, `2` accepted by a top type or
/// open parameter. `None` when it does not fit.
pub(crate) fn fit_tier(param: &IrType, arg: &IrType) -> Option<u8> {
    let arg = arg.widen_literal();
    if param.canonical() == arg.canonical() {
        return Some(0);
    }
    if param.is_nullable() && !param.is_nullish() {
        if arg.is_nullish() {
            return Some(0);
        }
        return fit_tier(&param.non_null(), &arg);
    }
    match (param, &arg) {
        (IrType::Primitive(p), IrType::Primitive(a)) if a.widens_to(*p) => Some(1),
        (IrType::Any | IrType::Unknown | IrType::TypeParameter(_), _) => Some(2),
        (_, IrType::Any | IrType::Unknown) => Some(2),
        (IrType::Reference { id, .. }, _) if id.platform_name.as_ref() == tsharp_catalog::universe::OBJECT_TYPE => {
            Some(2)
        }
        (IrType::Array(p), IrType::Array(a)) => fit_tier(p, a).map(|t| t.max(1)),
        (IrType::Reference { id: p, .. }, IrType::Reference { id: a, .. }) if p == a => Some(1),
        (IrType::Function(p), IrType::Function(a)) if p.params.len() >= a.params.len() => Some(1),
        (IrType::Union(members), _) => members.iter().filter_map(|m| fit_tier(m, &arg)).min().map(|t| t.max(1)),
        _ => None,
    }
}

/// How well an unsuffixed numeric literal with text `raw` fits `param`.
/// The literal takes the parameter's numeric kind, so integral text fits
/// every numeric type and fractional text only the non-integral ones.
pub(crate) fn literal_fit(param: &IrType, raw: &str) -> Option<u8> {
    match param.non_null() {
        IrType::Primitive(PrimitiveKind::Number) => Some(0),
        IrType::Primitive(kind) if kind.is_numeric() => (!kind.is_integral() || !is_fractional(raw)).then_some(1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_kind_follows_expected() {
        let int = IrType::Primitive(PrimitiveKind::Int);
        assert_eq!(literal_kind(Some(&int)), PrimitiveKind::Int);
        assert_eq!(literal_kind(Some(&int.clone().nullable())), PrimitiveKind::Int);
        assert_eq!(literal_kind(Some(&IrType::string())), PrimitiveKind::Number);
        assert_eq!(literal_kind(None), PrimitiveKind::Number);
    }

    #[test]
    fn test_fractional_detection() {
        assert!(is_fractional("1.5"));
        assert!(!is_fractional("1.0"));
        assert!(!is_fractional("42"));
        assert!(!is_fractional("0x1F"));
        assert!(!is_fractional("1e3"));
    }

    #[test]
    fn test_operator_table() {
        let int = IrType::Primitive(PrimitiveKind::Int);
        assert_eq!(binary_result(IrBinaryOp::Add, &int, &int), int);
        assert_eq!(binary_result(IrBinaryOp::Add, &int, &IrType::number()), IrType::number());
        assert_eq!(binary_result(IrBinaryOp::Add, &IrType::string(), &int), IrType::string());
        assert_eq!(binary_result(IrBinaryOp::Lt, &int, &int), IrType::boolean());
        assert_eq!(
            binary_result(IrBinaryOp::Coalesce, &IrType::string().nullable(), &IrType::string()),
            IrType::string()
        );
    }

    #[test]
    fn test_unify_through_arrays_and_functions() {
        let params = vec!["T".to_string(), "U".to_string()];
        let mut map = HashMap::new();
        let param = IrType::Array(Box::new(IrType::type_param("T")));
        unify(&param, &IrType::Array(Box::new(IrType::string())), &params, &mut map);
        assert_eq!(map.get("T"), Some(&IrType::string()));

        let f = |p: IrType, r: IrType| {
            IrType::Function(Box::new(tsharp_catalog::FunctionShape {
                params: vec![tsharp_catalog::FunctionParam {
                    name: "x".into(),
                    ty: p,
                    optional: false,
                    rest: false,
                }],
                ret: r,
                is_async: false,
            }))
        };
        unify(
            &f(IrType::type_param("T"), IrType::type_param("U")),
            &f(IrType::string(), IrType::number()),
            &params,
            &mut map,
        );
        assert_eq!(map.get("U"), Some(&IrType::number()));
    }

    #[test]
    fn test_fit_tiers() {
        let int = IrType::Primitive(PrimitiveKind::Int);
        assert_eq!(fit_tier(&IrType::number(), &IrType::number()), Some(0));
        assert_eq!(fit_tier(&IrType::number(), &int), Some(1));
        assert_eq!(fit_tier(&int, &IrType::number()), None);
        assert_eq!(fit_tier(&IrType::string().nullable(), &IrType::string()), Some(0));
        assert_eq!(fit_tier(&IrType::Any, &IrType::string()), Some(2));
    }

    #[test]
    fn test_literal_fit() {
        let int = IrType::Primitive(PrimitiveKind::Int);
        let float = IrType::Primitive(PrimitiveKind::Float);
        assert_eq!(literal_fit(&IrType::number(), "3"), Some(0));
        assert_eq!(literal_fit(&int, "3"), Some(1));
        assert_eq!(literal_fit(&int.clone().nullable(), "0x1F"), Some(1));
        assert_eq!(literal_fit(&int, "1.5"), None);
        assert_eq!(literal_fit(&float, "1.5"), Some(1));
        assert_eq!(literal_fit(&IrType::string(), "3"), None);
    }

    #[test]
    fn test_awaited_unwraps_tasks() {
        assert_eq!(awaited(&task_of(IrType::string())), IrType::string());
        assert_eq!(awaited(&task_of(IrType::void())), IrType::void());
    }
}
