//! Subject binding: a vouch must be about the local identity.
//!
//! The subject signed into the expansion is compared with the locally
//! loaded user on username, uid, and eldest kid. All three are exact,
//! case-sensitive comparisons.

use crate::error::{Result, SubjectField, VouchError};
use crate::expansion::ExpansionUser;
use crate::identity::LocalIdentity;

/// Fail with `SubjectMismatch` unless `subject` is exactly `me`.
pub fn assert_vouch_is_for_me(me: &LocalIdentity, subject: &ExpansionUser) -> Result<()> {
    check(SubjectField::Username, &me.username, &subject.username)?;
    check(SubjectField::Uid, me.uid.as_str(), subject.uid.as_str())?;
    check(
        SubjectField::EldestKid,
        me.eldest_kid.as_str(),
        subject.eldest.kid.as_str(),
    )?;
    Ok(())
}

fn check(field: SubjectField, expected: &str, actual: &str) -> Result<()> {
    if expected != actual {
        return Err(VouchError::SubjectMismatch {
            field,
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}
