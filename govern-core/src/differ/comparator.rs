//! Recursive structural comparison of two type graphs.

use tracing::trace;

use crate::differ::changes::{ChangeKind, Outcome};
use crate::differ::guard::ComparisonPair;
use crate::types::{TypeArena, TypeId, TypeNode};

/// Compares nodes of an old type graph against nodes of a new one.
///
/// The comparator borrows both arenas for the duration of one comparison and
/// holds no other state; cycle tracking travels down the recursion as a
/// [`ComparisonPair`] chain, so independent comparisons never interfere.
pub struct TypeComparator<'a> {
    pub(super) old: &'a TypeArena,
    pub(super) new: &'a TypeArena,
}

impl<'a> TypeComparator<'a> {
    pub fn new(old: &'a TypeArena, new: &'a TypeArena) -> Self {
        Self { old, new }
    }

    /// Compare `old` (in the old arena) with `new` (in the new arena).
    ///
    /// `guard` is the chain of struct/interface comparisons currently open
    /// above this call; pass `None` at the top level.
    pub fn compare(&self, old: TypeId, new: TypeId, guard: Option<&ComparisonPair<'_>>) -> Outcome {
        if std::ptr::eq(self.old, self.new) && old == new {
            return Outcome::identical();
        }

        let x = match self.old.get(old) {
            Some(node) => node,
            None => {
                return Outcome::change(
                    ChangeKind::MalformedType,
                    format!("old type {} is absent", old),
                )
            }
        };
        let y = match self.new.get(new) {
            Some(node) => node,
            None => {
                return Outcome::change(
                    ChangeKind::MalformedType,
                    format!("new type {} is absent", new),
                )
            }
        };

        match x {
            TypeNode::Basic(a) => {
                let TypeNode::Basic(b) = y else {
                    return variant_mismatch(x, y);
                };
                if a == b {
                    Outcome::identical()
                } else {
                    Outcome::change(
                        ChangeKind::TypeMismatch,
                        format!("basic kind mismatch: {} != {}", a, b),
                    )
                }
            }

            TypeNode::Array { len: xl, elem: xe } => {
                let TypeNode::Array { len: yl, elem: ye } = y else {
                    return variant_mismatch(x, y);
                };
                // Unknown lengths match anything.
                if let (Some(a), Some(b)) = (xl, yl) {
                    if a != b {
                        return Outcome::change(
                            ChangeKind::ArrayLengthMismatch,
                            format!("array length mismatch: {} != {}", a, b),
                        );
                    }
                }
                self.compare(*xe, *ye, guard).within("array element")
            }

            TypeNode::Slice { elem: xe } => {
                let TypeNode::Slice { elem: ye } = y else {
                    return variant_mismatch(x, y);
                };
                self.compare(*xe, *ye, guard).within("slice element")
            }

            TypeNode::Pointer { elem: xe } => {
                let TypeNode::Pointer { elem: ye } = y else {
                    return variant_mismatch(x, y);
                };
                self.compare(*xe, *ye, guard).within("pointer element")
            }

            TypeNode::Tuple { elems: xs } => {
                let TypeNode::Tuple { elems: ys } = y else {
                    return variant_mismatch(x, y);
                };
                self.compare_tuples(xs, ys, guard)
            }

            TypeNode::Signature {
                variadic: xv,
                params: xp,
                results: xr,
            } => {
                let TypeNode::Signature {
                    variadic: yv,
                    params: yp,
                    results: yr,
                } = y
                else {
                    return variant_mismatch(x, y);
                };
                if xv != yv {
                    return Outcome::change(
                        ChangeKind::VariadicMismatch,
                        format!("variadic mismatch: {} != {}", xv, yv),
                    );
                }
                let mut outcome = self.compare(*xp, *yp, guard).within("params");
                outcome.merge(self.compare(*xr, *yr, guard).within("results"));
                outcome
            }

            TypeNode::Map { key: xk, elem: xe } => {
                let TypeNode::Map { key: yk, elem: ye } = y else {
                    return variant_mismatch(x, y);
                };
                let mut outcome = self.compare(*xk, *yk, guard).within("map key");
                outcome.merge(self.compare(*xe, *ye, guard).within("map element"));
                outcome
            }

            TypeNode::Channel { dir: xd, elem: xe } => {
                let TypeNode::Channel { dir: yd, elem: ye } = y else {
                    return variant_mismatch(x, y);
                };
                if xd != yd {
                    return Outcome::change(
                        ChangeKind::ChannelDirectionMismatch,
                        format!(
                            "channel direction mismatch: {} != {}",
                            xd.as_str(),
                            yd.as_str()
                        ),
                    );
                }
                self.compare(*xe, *ye, guard).within("channel element")
            }

            TypeNode::Named {
                name: xn,
                underlying: xu,
            } => {
                let TypeNode::Named {
                    name: yn,
                    underlying: yu,
                } = y
                else {
                    return variant_mismatch(x, y);
                };
                let (Some(a), Some(b)) = (xu, yu) else {
                    let (side, name) = if xu.is_none() {
                        ("old", xn)
                    } else {
                        ("new", yn)
                    };
                    return Outcome::change(
                        ChangeKind::MalformedType,
                        format!("{} named type {:?} has no underlying type", side, name),
                    );
                };
                let sides = [("old", self.old, old, xn), ("new", self.new, new, yn)];
                for (side, arena, id, name) in sides {
                    if arena.in_named_cycle(id) {
                        return Outcome::change(
                            ChangeKind::MalformedType,
                            format!(
                                "{} named type {:?} never reaches a structural type",
                                side, name
                            ),
                        );
                    }
                }

                // type S []S and friends loop back through the name alone.
                let pair = ComparisonPair::new(old, new, guard);
                if pair.is_repeat() {
                    trace!(%old, %new, depth = pair.depth(), "named pair already open");
                    return Outcome::identical();
                }

                // Two versions never share a declaration, so only the
                // underlying structure is compared.
                self.compare(*a, *b, Some(&pair))
            }

            TypeNode::Struct { fields: xf } => {
                let TypeNode::Struct { fields: yf } = y else {
                    return variant_mismatch(x, y);
                };
                self.compare_structs(old, new, xf, yf, guard)
            }

            TypeNode::Interface { methods: xm } => {
                let TypeNode::Interface { methods: ym } = y else {
                    return variant_mismatch(x, y);
                };
                self.compare_interfaces(old, new, xm, ym, guard)
            }
        }
    }

    /// Parameter and result lists correspond by position, not by name.
    fn compare_tuples(
        &self,
        xs: &[TypeId],
        ys: &[TypeId],
        guard: Option<&ComparisonPair<'_>>,
    ) -> Outcome {
        if xs.len() != ys.len() {
            return Outcome::change(
                ChangeKind::ArityMismatch,
                format!("arity mismatch: {} != {}", xs.len(), ys.len()),
            );
        }

        for (i, (x, y)) in xs.iter().zip(ys).enumerate() {
            let outcome = self.compare(*x, *y, guard);
            if !outcome.is_identical() {
                return outcome.within(format!("position {}", i));
            }
        }
        Outcome::identical()
    }
}

fn variant_mismatch(x: &TypeNode, y: &TypeNode) -> Outcome {
    Outcome::change(
        ChangeKind::TypeMismatch,
        format!("type mismatch: {} != {}", x.variant_name(), y.variant_name()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BasicKind, ChannelDir, Field};

    fn compare_in(old: &TypeArena, x: TypeId, new: &TypeArena, y: TypeId) -> Outcome {
        TypeComparator::new(old, new).compare(x, y, None)
    }

    fn first_kind(outcome: &Outcome) -> ChangeKind {
        outcome.diagnostics[0].kind
    }

    #[test]
    fn test_basic_same_kind() {
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let x = old.basic(BasicKind::Int64);
        let y = new.basic(BasicKind::Int64);
        assert!(compare_in(&old, x, &new, y).is_identical());
    }

    #[test]
    fn test_basic_kind_change_is_major() {
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let x = old.basic(BasicKind::Int64);
        let y = new.basic(BasicKind::Int32);

        let outcome = compare_in(&old, x, &new, y);
        assert!(outcome.major);
        assert_eq!(first_kind(&outcome), ChangeKind::TypeMismatch);
        assert_eq!(
            outcome.diagnostics[0].message,
            "basic kind mismatch: int64 != int32"
        );
    }

    #[test]
    fn test_variant_mismatch_names_both_variants() {
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let s = old.basic(BasicKind::String);
        let x = old.slice(s);
        let k = new.basic(BasicKind::String);
        let y = new.map(k, k);

        let outcome = compare_in(&old, x, &new, y);
        assert!(outcome.major);
        assert_eq!(outcome.diagnostics[0].message, "type mismatch: slice != map");
    }

    #[test]
    fn test_array_length() {
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let oe = old.basic(BasicKind::Uint8);
        let ne = new.basic(BasicKind::Uint8);

        let x = old.array(Some(16), oe);
        let y = new.array(Some(32), ne);
        let outcome = compare_in(&old, x, &new, y);
        assert!(outcome.major);
        assert_eq!(first_kind(&outcome), ChangeKind::ArrayLengthMismatch);

        let same = new.array(Some(16), ne);
        assert!(compare_in(&old, x, &new, same).is_identical());
    }

    #[test]
    fn test_array_unknown_length_is_wildcard() {
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let oe = old.basic(BasicKind::Uint8);
        let ne = new.basic(BasicKind::Uint8);
        let x = old.array(None, oe);
        let y = new.array(Some(32), ne);
        assert!(compare_in(&old, x, &new, y).is_identical());

        // Still recurses into the element.
        let nf = new.basic(BasicKind::Float64);
        let z = new.array(Some(32), nf);
        let outcome = compare_in(&old, x, &new, z);
        assert!(outcome.major);
        assert!(outcome.diagnostics[0].message.starts_with("array element: "));
    }

    #[test]
    fn test_pointer_and_slice_pass_through() {
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let oi = old.basic(BasicKind::Int);
        let op = old.pointer(oi);
        let x = old.slice(op);
        let ns = new.basic(BasicKind::String);
        let np = new.pointer(ns);
        let y = new.slice(np);

        let outcome = compare_in(&old, x, &new, y);
        assert!(outcome.major);
        assert_eq!(
            outcome.diagnostics[0].message,
            "slice element: pointer element: basic kind mismatch: int != string"
        );
    }

    #[test]
    fn test_tuple_arity_and_position() {
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let os = old.basic(BasicKind::String);
        let ob = old.basic(BasicKind::Bool);
        let x = old.tuple(vec![os, ob]);

        let ns = new.basic(BasicKind::String);
        let nb = new.basic(BasicKind::Bool);
        let shorter = new.tuple(vec![ns]);
        let outcome = compare_in(&old, x, &new, shorter);
        assert!(outcome.major);
        assert_eq!(first_kind(&outcome), ChangeKind::ArityMismatch);

        // Same types in swapped order differ by position.
        let swapped = new.tuple(vec![nb, ns]);
        let outcome = compare_in(&old, x, &new, swapped);
        assert!(outcome.major);
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0].message.starts_with("position 0: "));

        let same = new.tuple(vec![ns, nb]);
        assert!(compare_in(&old, x, &new, same).is_identical());
    }

    #[test]
    fn test_signature_variadic_mismatch() {
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let os = old.basic(BasicKind::String);
        let oslice = old.slice(os);
        let x = old.signature(vec![oslice], vec![], false);
        let ns = new.basic(BasicKind::String);
        let nslice = new.slice(ns);
        let y = new.signature(vec![nslice], vec![], true);

        let outcome = compare_in(&old, x, &new, y);
        assert!(outcome.major);
        assert_eq!(first_kind(&outcome), ChangeKind::VariadicMismatch);
    }

    #[test]
    fn test_signature_reports_params_and_results() {
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let oi = old.basic(BasicKind::Int);
        let x = old.signature(vec![oi], vec![oi], false);
        let nf = new.basic(BasicKind::Float64);
        let y = new.signature(vec![nf], vec![nf], false);

        let outcome = compare_in(&old, x, &new, y);
        assert_eq!(outcome.diagnostics.len(), 2);
        assert!(outcome.diagnostics[0].message.starts_with("params: "));
        assert!(outcome.diagnostics[1].message.starts_with("results: "));
    }

    #[test]
    fn test_map_key_change_is_major() {
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let os = old.basic(BasicKind::String);
        let oi = old.basic(BasicKind::Int);
        let x = old.map(os, oi);
        let ni = new.basic(BasicKind::Int);
        let y = new.map(ni, ni);

        let outcome = compare_in(&old, x, &new, y);
        assert!(outcome.major);
        assert!(outcome.diagnostics[0].message.starts_with("map key: "));
    }

    #[test]
    fn test_channel_direction() {
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let oi = old.basic(BasicKind::Int);
        let x = old.channel(ChannelDir::SendRecv, oi);
        let ni = new.basic(BasicKind::Int);
        let y = new.channel(ChannelDir::Recv, ni);

        let outcome = compare_in(&old, x, &new, y);
        assert!(outcome.major);
        assert_eq!(
            outcome.diagnostics[0].message,
            "channel direction mismatch: chan != <-chan"
        );
    }

    #[test]
    fn test_named_identity_ignored() {
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let ob = old.basic(BasicKind::Bool);
        let x = old.named("Wrapper", ob);
        let nb = new.basic(BasicKind::Bool);
        let y = new.named("Toggle", nb);
        assert!(compare_in(&old, x, &new, y).is_identical());
    }

    #[test]
    fn test_named_vs_unnamed_is_mismatch() {
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let ob = old.basic(BasicKind::Bool);
        let x = old.named("Wrapper", ob);
        let y = new.basic(BasicKind::Bool);

        let outcome = compare_in(&old, x, &new, y);
        assert!(outcome.major);
        assert_eq!(outcome.diagnostics[0].message, "type mismatch: named != basic");
    }

    #[test]
    fn test_absent_type_is_major() {
        let mut old = TypeArena::new();
        let new = TypeArena::new();
        let x = old.basic(BasicKind::Int);

        let outcome = compare_in(&old, x, &new, TypeId(3));
        assert!(outcome.major);
        assert_eq!(first_kind(&outcome), ChangeKind::MalformedType);
    }

    #[test]
    fn test_unresolved_named_is_major() {
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let x = old.declare_named("Pending");
        let nb = new.basic(BasicKind::Bool);
        let y = new.named("Pending", nb);

        let outcome = compare_in(&old, x, &new, y);
        assert!(outcome.major);
        assert_eq!(first_kind(&outcome), ChangeKind::MalformedType);
    }

    #[test]
    fn test_same_arena_same_id_short_circuits() {
        let mut types = TypeArena::new();
        // Malformed, but never inspected when compared against itself.
        let pending = types.declare_named("Pending");
        assert!(compare_in(&types, pending, &types, pending).is_identical());
    }

    #[test]
    fn test_map_element_change_is_major() {
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let os = old.basic(BasicKind::String);
        let oi = old.basic(BasicKind::Int);
        let x = old.map(os, oi);
        let ns = new.basic(BasicKind::String);
        let y = new.map(ns, ns);

        let outcome = compare_in(&old, x, &new, y);
        assert!(outcome.major);
        assert_eq!(
            outcome.diagnostics[0].message,
            "map element: basic kind mismatch: int != string"
        );
    }

    #[test]
    fn test_channel_element_change_is_major() {
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let oi = old.basic(BasicKind::Int);
        let x = old.channel(ChannelDir::Send, oi);
        let ni = new.basic(BasicKind::Int64);
        let y = new.channel(ChannelDir::Send, ni);

        let outcome = compare_in(&old, x, &new, y);
        assert!(outcome.major);
        assert_eq!(
            outcome.diagnostics[0].message,
            "channel element: basic kind mismatch: int != int64"
        );
    }

    #[test]
    fn test_minor_passes_through_slice_and_pointer() {
        // []*T where T gains a field.
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let oi = old.basic(BasicKind::Int);
        let ot = old.structure(vec![Field::new("A", oi, true)]);
        let ot = old.named("T", ot);
        let op = old.pointer(ot);
        let x = old.slice(op);

        let ni = new.basic(BasicKind::Int);
        let nt = new.structure(vec![Field::new("A", ni, true), Field::new("B", ni, true)]);
        let nt = new.named("T", nt);
        let np = new.pointer(nt);
        let y = new.slice(np);

        let outcome = compare_in(&old, x, &new, y);
        assert!(outcome.minor);
        assert!(!outcome.major);
        assert_eq!(first_kind(&outcome), ChangeKind::FieldAdded);
        assert_eq!(
            outcome.diagnostics[0].message,
            "slice element: pointer element: field added: \"B\""
        );
    }

    #[test]
    fn test_crossed_ids_across_arenas_are_distinct() {
        // old: Inner #3 { V int }, Outer #4 { Inner #3 }
        let mut old = TypeArena::new();
        let oi = old.basic(BasicKind::Int);
        old.basic(BasicKind::Bool);
        old.basic(BasicKind::Bool);
        let old_inner = old.structure(vec![Field::new("V", oi, true)]);
        let old_outer = old.structure(vec![Field::new("Inner", old_inner, true)]);
        assert_eq!((old_inner, old_outer), (TypeId(3), TypeId(4)));

        // new: Outer #3 { Inner #4 }, Inner #4 { V string }
        let mut new = TypeArena::new();
        let ns = new.basic(BasicKind::String);
        new.basic(BasicKind::Bool);
        new.basic(BasicKind::Bool);
        let new_outer = new.add(TypeNode::Struct {
            fields: vec![Field::new("Inner", TypeId(4), true)],
        });
        let new_inner = new.structure(vec![Field::new("V", ns, true)]);
        assert_eq!((new_outer, new_inner), (TypeId(3), TypeId(4)));

        let outcome = compare_in(&old, old_outer, &new, new_outer);
        assert!(outcome.major);
        assert_eq!(
            outcome.diagnostics[0].message,
            "field \"Inner\": field \"V\": basic kind mismatch: int != string"
        );
    }

    fn make_slice_of_self(types: &mut TypeArena, depth: usize) -> TypeId {
        // type S []S, or type S [][]S for depth 2
        let s = types.declare_named("S");
        let mut elem = s;
        for _ in 0..depth {
            elem = types.slice(elem);
        }
        types.set_underlying(s, elem).unwrap();
        s
    }

    #[test]
    fn test_named_slice_cycle_terminates() {
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let x = make_slice_of_self(&mut old, 1);
        let y = make_slice_of_self(&mut new, 1);
        assert!(compare_in(&old, x, &new, y).is_identical());

        let mut deeper = TypeArena::new();
        let z = make_slice_of_self(&mut deeper, 2);
        let outcome = compare_in(&old, x, &deeper, z);
        assert!(outcome.major);
        assert_eq!(
            outcome.diagnostics[0].message,
            "slice element: type mismatch: named != slice"
        );
    }

    #[test]
    fn test_named_signature_cycle_terminates() {
        // type F func() F
        let build = |types: &mut TypeArena| {
            let f = types.declare_named("F");
            let sig = types.signature(vec![], vec![f], false);
            types.set_underlying(f, sig).unwrap();
            f
        };
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let x = build(&mut old);
        let y = build(&mut new);
        assert!(compare_in(&old, x, &new, y).is_identical());
    }

    #[test]
    fn test_self_pointing_named_is_malformed() {
        let build = |types: &mut TypeArena| {
            let a = types.declare_named("A");
            types.set_underlying(a, a).unwrap();
            a
        };
        let mut old = TypeArena::new();
        let mut new = TypeArena::new();
        let x = build(&mut old);
        let y = build(&mut new);

        let outcome = compare_in(&old, x, &new, y);
        assert!(outcome.major);
        assert_eq!(first_kind(&outcome), ChangeKind::MalformedType);
        assert_eq!(
            outcome.diagnostics[0].message,
            "old named type \"A\" never reaches a structural type"
        );
    }
}
