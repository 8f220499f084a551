//! This file defines the `Category` type, the fixed set of spending categories an expense can be
//! filed under.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// What an expense was spent on.
///
/// Users pick one of the [Category::SELECTABLE] categories when adding an expense.
/// [Category::Uncategorized] is never selectable, it is the fallback for stored expenses whose
/// category is missing or no longer recognised.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Groceries, restaurants, takeaways.
    Food,
    /// Public transport, fuel, taxis.
    Transportation,
    /// Movies, games, events.
    Entertainment,
    /// Clothes and other shopping.
    Shopping,
    /// Doctors, pharmacy, gym.
    Health,
    /// Utilities and subscriptions.
    Bills,
    /// Rent or mortgage payments.
    Rent,
    /// Anything that does not fit the other categories.
    Other,
    /// The category was not recorded.
    Uncategorized,
}

impl Category {
    /// The categories a user can choose from, in display order.
    pub const SELECTABLE: [Category; 8] = [
        Category::Food,
        Category::Transportation,
        Category::Entertainment,
        Category::Shopping,
        Category::Health,
        Category::Bills,
        Category::Rent,
        Category::Other,
    ];

    /// The display name of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transportation => "Transportation",
            Category::Entertainment => "Entertainment",
            Category::Shopping => "Shopping",
            Category::Health => "Health",
            Category::Bills => "Bills",
            Category::Rent => "Rent",
            Category::Other => "Other",
            Category::Uncategorized => "Uncategorized",
        }
    }

    /// Map the category text of a stored or imported expense to a category.
    ///
    /// Missing, empty or unrecognised text maps to [Category::Uncategorized].
    pub fn from_stored(text: Option<&str>) -> Self {
        text.and_then(|text| text.parse().ok())
            .unwrap_or(Category::Uncategorized)
    }
}

impl FromStr for Category {
    type Err = Error;

    /// Parse a selectable category name, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [Error::MissingCategory] for an empty name, or
    /// [Error::InvalidCategory] if the name is not a selectable category.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();

        if name.is_empty() {
            return Err(Error::MissingCategory);
        }

        Category::SELECTABLE
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::InvalidCategory(name.to_owned()))
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
