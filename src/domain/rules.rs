//! Client-side rule hints.
//!
//! The server enforces every rule; these helpers only decide what a view
//! should offer (an enabled "roll again" or "build" button). A hint that
//! disagrees with the server is harmless: the server answer wins.

use std::collections::HashSet;

use super::entities::{DiceRoll, ParticipantProperty, Property};
use super::ids::{ParticipantId, PropertyId};

/// Houses allowed before the next building is a hotel.
pub const MAX_HOUSES: u8 = 4;

/// Returns `true` if more than one die was rolled and all show the same face.
#[must_use]
pub fn is_double(results: &[i32]) -> bool {
    match results.split_first() {
        Some((first, rest)) if !rest.is_empty() => rest.iter().all(|r| r == first),
        _ => false,
    }
}

/// Returns `true` if the roll entitles the roller to roll again.
#[must_use]
pub fn may_roll_again(roll: &DiceRoll) -> bool {
    roll.dice_count > 1 && is_double(&roll.results)
}

/// What the next build on a property would add.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Building {
    /// One more house.
    House,
    /// Four houses become a hotel.
    Hotel,
}

/// Why a property cannot be built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildBlocker {
    /// The property has no building cost (railroad, utility).
    NotBuildable,
    /// The participant does not own it.
    NotOwned,
    /// Some property in the color group belongs to someone else.
    IncompleteGroup,
    /// Some property in the color group is mortgaged.
    GroupMortgaged,
    /// Already has a hotel.
    FullyBuilt,
}

/// Returns what building comes next on a holding, or `None` once it has a
/// hotel.
#[must_use]
pub const fn next_building(holding: &ParticipantProperty) -> Option<Building> {
    if holding.hotel_count > 0 {
        None
    } else if holding.house_count >= MAX_HOUSES {
        Some(Building::Hotel)
    } else {
        Some(Building::House)
    }
}

/// Returns `true` if `owner`'s rows in `holdings` cover every property of
/// `group_color` in `catalog`.
///
/// `holdings` may be the whole game's ownership list; rows of other
/// participants are ignored.
#[must_use]
pub fn has_monopoly(
    owner: ParticipantId,
    group_color: &str,
    holdings: &[ParticipantProperty],
    catalog: &[Property],
) -> bool {
    let owned: HashSet<PropertyId> = holdings
        .iter()
        .filter(|h| h.participant_id == owner)
        .map(|h| h.property_id)
        .collect();
    let mut group = catalog.iter().filter(|p| p.group_color == group_color).peekable();
    group.peek().is_some() && group.all(|p| owned.contains(&p.id))
}

/// Decides whether `owner` may build on `property`, and what the build
/// would add. `holdings` may include other participants' rows.
///
/// # Errors
///
/// Returns the first [`BuildBlocker`] that applies.
pub fn can_build(
    owner: ParticipantId,
    property: &Property,
    holdings: &[ParticipantProperty],
    catalog: &[Property],
) -> Result<Building, BuildBlocker> {
    if property.house_cost.is_none() {
        return Err(BuildBlocker::NotBuildable);
    }
    let holding = holdings
        .iter()
        .find(|h| h.participant_id == owner && h.property_id == property.id)
        .ok_or(BuildBlocker::NotOwned)?;
    if !has_monopoly(owner, &property.group_color, holdings, catalog) {
        return Err(BuildBlocker::IncompleteGroup);
    }
    let group: HashSet<PropertyId> = catalog
        .iter()
        .filter(|p| p.group_color == property.group_color)
        .map(|p| p.id)
        .collect();
    if holdings
        .iter()
        .any(|h| h.participant_id == owner && group.contains(&h.property_id) && h.is_mortgaged)
    {
        return Err(BuildBlocker::GroupMortgaged);
    }
    next_building(holding).ok_or(BuildBlocker::FullyBuilt)
}

/// Returns `true` if the holding can be mortgaged: not already mortgaged and
/// no buildings on it.
#[must_use]
pub const fn can_mortgage(holding: &ParticipantProperty) -> bool {
    !holding.is_mortgaged && holding.house_count == 0 && holding.hotel_count == 0
}

/// Refund for selling the top building: half the hotel cost for a hotel,
/// half the house cost for a house, `None` with nothing built.
#[must_use]
pub fn sell_refund(property: &Property, holding: &ParticipantProperty) -> Option<i64> {
    if holding.hotel_count > 0 {
        property.hotel_cost.map(|c| c / 2)
    } else if holding.house_count > 0 {
        property.house_cost.map(|c| c / 2)
    } else {
        None
    }
}
