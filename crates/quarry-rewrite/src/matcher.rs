//! Carrier member matching.
//!
//! Given a carrier's members (in declaration order) and the ordered list of
//! types the original parameters declare, pick one distinct member per
//! parameter. The k-th parameter of type `T` takes the k-th member that fits
//! `T`, so `(Int, Int)` against `{ a: Int, b: Int }` binds `a` then `b`.
//!
//! Matching is greedy and never backtracks: an earlier parameter keeps the
//! member it claimed even if a later parameter then has nothing left.

use quarry_ast::{FieldDef, Ty};

use crate::error::RewriteError;
use crate::options::MatchMode;

/// One selected carrier member.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberSlot {
    /// Position of the member in the carrier's declaration order.
    pub index: usize,
    pub name: String,
    pub ty: Ty,
}

/// The members chosen for one (carrier, expected types) pair, in the order
/// of the expected types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberPlan {
    pub carrier: Ty,
    pub slots: Vec<MemberSlot>,
}

impl MemberPlan {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.name.as_str())
    }
}

fn fits(member: &Ty, expected: &Ty, mode: MatchMode) -> bool {
    match mode {
        MatchMode::Exact => member == expected,
        MatchMode::Assignable => member.is_assignable_to(expected),
    }
}

/// Match `expected` types against `members` of `carrier`.
pub fn match_members(
    carrier: &Ty,
    members: &[FieldDef],
    expected: &[Ty],
    mode: MatchMode,
) -> Result<MemberPlan, RewriteError> {
    let mut claimed = vec![false; members.len()];
    let mut slots = Vec::with_capacity(expected.len());

    for (k, ty) in expected.iter().enumerate() {
        let skip = expected[..k].iter().filter(|t| *t == ty).count();
        let candidates: Vec<usize> = members
            .iter()
            .enumerate()
            .filter(|(_, m)| fits(&m.ty, ty, mode))
            .map(|(i, _)| i)
            .collect();

        if candidates.is_empty() {
            return Err(RewriteError::NoMatchingMember {
                carrier: carrier.clone(),
                expected: ty.clone(),
            });
        }

        let chosen = candidates
            .iter()
            .skip(skip)
            .copied()
            .find(|&i| !claimed[i])
            .ok_or_else(|| RewriteError::InsufficientMembers {
                carrier: carrier.clone(),
                expected: ty.clone(),
                required: skip + 1,
                found: candidates.len(),
            })?;

        claimed[chosen] = true;
        slots.push(MemberSlot {
            index: chosen,
            name: members[chosen].name.clone(),
            ty: members[chosen].ty.clone(),
        });
    }

    Ok(MemberPlan {
        carrier: carrier.clone(),
        slots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carrier() -> Ty {
        Ty::struct_ty("Carrier", vec![])
    }

    fn names(plan: &MemberPlan) -> Vec<&str> {
        plan.names().collect()
    }

    #[test]
    fn distinct_types_bind_by_type() {
        let members = vec![
            FieldDef::new("first", Ty::int()),
            FieldDef::new("second", Ty::string()),
        ];
        let plan = match_members(
            &carrier(),
            &members,
            &[Ty::string(), Ty::int()],
            MatchMode::Assignable,
        )
        .unwrap();
        assert_eq!(names(&plan), vec!["second", "first"]);
        assert_eq!(plan.slots[0].index, 1);
    }

    #[test]
    fn same_types_bind_in_declaration_order() {
        let members = vec![
            FieldDef::new("a", Ty::int()),
            FieldDef::new("label", Ty::string()),
            FieldDef::new("b", Ty::int()),
            FieldDef::new("c", Ty::int()),
        ];
        let plan = match_members(
            &carrier(),
            &members,
            &[Ty::int(), Ty::string(), Ty::int()],
            MatchMode::Exact,
        )
        .unwrap();
        assert_eq!(names(&plan), vec!["a", "label", "b"]);
    }

    #[test]
    fn claimed_members_are_not_reused() {
        // `Option<Int>` accepts both members; the earlier `Int` parameter
        // already took `outer`.
        let members = vec![
            FieldDef::new("outer", Ty::int()),
            FieldDef::new("inner", Ty::option(Ty::int())),
        ];
        let plan = match_members(
            &carrier(),
            &members,
            &[Ty::int(), Ty::option(Ty::int())],
            MatchMode::Assignable,
        )
        .unwrap();
        assert_eq!(names(&plan), vec!["outer", "inner"]);

        let both_optional = match_members(
            &carrier(),
            &members,
            &[Ty::option(Ty::int()), Ty::option(Ty::int())],
            MatchMode::Assignable,
        )
        .unwrap();
        assert_eq!(names(&both_optional), vec!["outer", "inner"]);
    }

    #[test]
    fn exact_mode_does_not_lift() {
        let members = vec![FieldDef::new("outer", Ty::int())];
        let err = match_members(
            &carrier(),
            &members,
            &[Ty::option(Ty::int())],
            MatchMode::Exact,
        )
        .unwrap_err();
        assert!(matches!(err, RewriteError::NoMatchingMember { .. }));
    }

    #[test]
    fn missing_type_fails() {
        let members = vec![FieldDef::new("n", Ty::int())];
        let err = match_members(&carrier(), &members, &[Ty::bool()], MatchMode::Assignable)
            .unwrap_err();
        assert_eq!(
            err,
            RewriteError::NoMatchingMember {
                carrier: carrier(),
                expected: Ty::bool(),
            }
        );
    }

    #[test]
    fn too_few_same_typed_members_fails() {
        let members = vec![FieldDef::new("n", Ty::int()), FieldDef::new("s", Ty::string())];
        let err = match_members(
            &carrier(),
            &members,
            &[Ty::int(), Ty::int()],
            MatchMode::Assignable,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RewriteError::InsufficientMembers {
                carrier: carrier(),
                expected: Ty::int(),
                required: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn earlier_lifted_param_is_not_reassigned() {
        // `Option<Int>` claims `a` first; binding it to `b` instead would
        // succeed but swap which member each parameter reads.
        let members = vec![
            FieldDef::new("a", Ty::int()),
            FieldDef::new("b", Ty::option(Ty::int())),
        ];
        let err = match_members(
            &carrier(),
            &members,
            &[Ty::option(Ty::int()), Ty::int()],
            MatchMode::Assignable,
        )
        .unwrap_err();
        assert_eq!(
            err,
            RewriteError::InsufficientMembers {
                carrier: carrier(),
                expected: Ty::int(),
                required: 1,
                found: 1,
            }
        );
    }
}
