//! Quantity expansion, order grouping and page splitting

use std::cmp::Ordering;

use crate::layout::{GridLayout, GridPosition};
use crate::types::{LoadedCard, LoadedItem, Result, SheetError};

/// One physical sheet's worth of placed cards
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based page number
    pub number: usize,
    pub cards: Vec<(LoadedCard, GridPosition)>,
}

impl Page {
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Keys of the placed cards, in placement order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.cards.iter().map(|(card, _)| card.key.as_str())
    }
}

/// Expand every item into `quantity` card copies sharing the same images.
pub fn expand(items: Vec<LoadedItem>) -> Vec<LoadedCard> {
    let total = items.iter().map(|item| item.quantity as usize).sum();
    let mut cards = Vec::with_capacity(total);
    for LoadedItem { card, quantity } in items {
        for _ in 0..quantity {
            cards.push(card.clone());
        }
    }
    cards
}

/// Sort position of an order key
///
/// Numeric keys come first in numeric order; everything else ties after
/// them so the stable sort leaves it in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum OrderRank<'a> {
    Numeric(&'a str),
    Other,
}

impl<'a> OrderRank<'a> {
    fn of(key: Option<&'a str>) -> Self {
        match key {
            Some(key) if !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit()) => {
                OrderRank::Numeric(key.trim_start_matches('0'))
            }
            _ => OrderRank::Other,
        }
    }
}

impl Ord for OrderRank<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            // Digits without leading zeros: shorter is smaller, then lexical
            (OrderRank::Numeric(a), OrderRank::Numeric(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (OrderRank::Numeric(_), OrderRank::Other) => Ordering::Less,
            (OrderRank::Other, OrderRank::Numeric(_)) => Ordering::Greater,
            (OrderRank::Other, OrderRank::Other) => Ordering::Equal,
        }
    }
}

impl PartialOrd for OrderRank<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two order keys the way pages are grouped
pub fn compare_order_keys(a: Option<&str>, b: Option<&str>) -> Ordering {
    OrderRank::of(a).cmp(&OrderRank::of(b))
}

/// Gather items sharing an order key into contiguous runs.
///
/// Groups appear in numeric key order; non-numeric keys and missing keys
/// follow in first-appearance order. Items keep their relative order inside
/// a group, and nothing is added or dropped.
pub fn group_by_order<T, F>(items: Vec<T>, order_key: F) -> Vec<T>
where
    F: Fn(&T) -> Option<&str>,
{
    let mut groups: Vec<(Option<String>, Vec<T>)> = Vec::new();
    for item in items {
        let key = order_key(&item).map(str::to_owned);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, group)) => group.push(item),
            None => groups.push((key, vec![item])),
        }
    }

    groups.sort_by(|(a, _), (b, _)| compare_order_keys(a.as_deref(), b.as_deref()));
    groups.into_iter().flat_map(|(_, group)| group).collect()
}

/// Group cards by order key
pub fn group_cards(cards: Vec<LoadedCard>) -> Vec<LoadedCard> {
    group_by_order(cards, |card| card.order_key.as_deref())
}

/// Cut the card sequence into capacity-sized pages.
///
/// Groups may straddle a page boundary.
pub fn paginate(cards: Vec<LoadedCard>, grid: &GridLayout) -> Result<Vec<Page>> {
    let capacity = grid.capacity();
    if capacity == 0 {
        return Err(SheetError::CapacityExceeded {
            count: cards.len(),
            capacity,
        });
    }

    let mut pages = Vec::with_capacity(cards.len().div_ceil(capacity));
    let mut remaining = cards.into_iter().peekable();
    while remaining.peek().is_some() {
        let chunk: Vec<LoadedCard> = remaining.by_ref().take(capacity).collect();
        pages.push(Page {
            number: pages.len() + 1,
            cards: grid.place(chunk)?,
        });
    }
    Ok(pages)
}

/// Place every card on one page, failing if they do not fit
pub fn single_page(cards: Vec<LoadedCard>, grid: &GridLayout) -> Result<Vec<Page>> {
    if cards.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![Page {
        number: 1,
        cards: grid.place(cards)?,
    }])
}
