//! The fixed table of transaction categories.
//!
//! Categories are defined client-side, the upstream API only stores the ID.

use crate::transaction::TransactionType;

/// Alias for the integer type used for category IDs.
pub type CategoryId = i64;

/// A named group of transactions of the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    /// The ID sent to the upstream API.
    pub id: CategoryId,
    /// The display name.
    pub name: &'static str,
    /// The type of transaction the category applies to.
    pub transaction_type: TransactionType,
}

const fn expense(id: CategoryId, name: &'static str) -> Category {
    Category {
        id,
        name,
        transaction_type: TransactionType::Expense,
    }
}

const fn income(id: CategoryId, name: &'static str) -> Category {
    Category {
        id,
        name,
        transaction_type: TransactionType::Income,
    }
}

/// Every category, ordered by ID.
pub const CATEGORIES: [Category; 14] = [
    expense(1, "Food & Drink"),
    expense(2, "Groceries"),
    expense(3, "Transport"),
    expense(4, "Housing"),
    expense(5, "Utilities"),
    expense(6, "Health"),
    expense(7, "Entertainment"),
    expense(8, "Shopping"),
    expense(9, "Education"),
    expense(10, "Other Expense"),
    income(11, "Salary"),
    income(12, "Business"),
    income(13, "Investments"),
    income(14, "Other Income"),
];

/// The name shown for IDs that are not in [CATEGORIES].
pub const UNKNOWN_CATEGORY_NAME: &str = "Other";

/// Look up a category by its ID.
pub fn get_category(id: CategoryId) -> Option<&'static Category> {
    CATEGORIES.iter().find(|category| category.id == id)
}

/// The display name for `id`, or [UNKNOWN_CATEGORY_NAME] if there is no such category.
pub fn category_name(id: CategoryId) -> &'static str {
    get_category(id)
        .map(|category| category.name)
        .unwrap_or(UNKNOWN_CATEGORY_NAME)
}

/// The categories that can be chosen for `transaction_type`.
pub fn categories_for(transaction_type: TransactionType) -> impl Iterator<Item = &'static Category> {
    CATEGORIES
        .iter()
        .filter(move |category| category.transaction_type == transaction_type)
}

/// The category selected when the user picks a transaction type.
pub fn default_category(transaction_type: TransactionType) -> CategoryId {
    match transaction_type {
        TransactionType::Expense => 1,
        TransactionType::Income => 11,
    }
}

/// The category assigned to transactions read from an image.
pub fn fallback_category(transaction_type: TransactionType) -> CategoryId {
    match transaction_type {
        TransactionType::Expense => 10,
        TransactionType::Income => 14,
    }
}

#[cfg(test)]
mod tests {
    use crate::transaction::TransactionType;

    use super::{
        CATEGORIES, UNKNOWN_CATEGORY_NAME, categories_for, category_name, default_category,
        fallback_category, get_category,
    };

    #[test]
    fn ids_are_unique_and_ordered() {
        for pair in CATEGORIES.windows(2) {
            assert!(
                pair[0].id < pair[1].id,
                "want ascending IDs, got {} then {}",
                pair[0].id,
                pair[1].id
            );
        }
    }

    #[test]
    fn default_and_fallback_categories_match_type() {
        for transaction_type in [TransactionType::Expense, TransactionType::Income] {
            for id in [
                default_category(transaction_type),
                fallback_category(transaction_type),
            ] {
                let category = get_category(id).expect("category should exist");
                assert_eq!(category.transaction_type, transaction_type);
            }
        }
    }

    #[test]
    fn categories_for_type_only_returns_that_type() {
        let income = categories_for(TransactionType::Income)
            .map(|category| category.id)
            .collect::<Vec<_>>();

        assert_eq!(income, vec![11, 12, 13, 14]);
    }

    #[test]
    fn unknown_category_is_named_other() {
        assert_eq!(category_name(3), "Transport");
        assert_eq!(category_name(99), UNKNOWN_CATEGORY_NAME);
    }
}
