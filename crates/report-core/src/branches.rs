//! Registry of the branches a report can be requested for.

/// Branch code → name as typed into the portal's branch selector.
pub const BRANCHES: &[(u32, &str)] = &[(34, "FILIAL 34"), (43, "FILIAL 43"), (44, "FILIAL 44")];

/// Look up the portal name for `code`.
pub fn branch_name(code: u32) -> Option<&'static str> {
    BRANCHES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// All registered codes in ascending order.
pub fn branch_codes() -> Vec<u32> {
    let mut codes: Vec<u32> = BRANCHES.iter().map(|(c, _)| *c).collect();
    codes.sort_unstable();
    codes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_name_known() {
        assert_eq!(branch_name(34), Some("FILIAL 34"));
        assert_eq!(branch_name(44), Some("FILIAL 44"));
    }

    #[test]
    fn test_branch_name_unknown() {
        assert_eq!(branch_name(1), None);
    }

    #[test]
    fn test_branch_codes_sorted() {
        assert_eq!(branch_codes(), vec![34, 43, 44]);
    }
}
