//! The five chapters of the affordability story.

/// One chapter of the report / TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chapter {
    MacroTrend,
    MetroDivergence,
    AffordabilityBands,
    RentBurden,
    Snapshot,
}

impl Chapter {
    pub const ALL: [Chapter; 5] = [
        Chapter::MacroTrend,
        Chapter::MetroDivergence,
        Chapter::AffordabilityBands,
        Chapter::RentBurden,
        Chapter::Snapshot,
    ];

    /// 1-based position in the story.
    pub fn number(self) -> usize {
        self.index() + 1
    }

    pub fn index(self) -> usize {
        match self {
            Chapter::MacroTrend => 0,
            Chapter::MetroDivergence => 1,
            Chapter::AffordabilityBands => 2,
            Chapter::RentBurden => 3,
            Chapter::Snapshot => 4,
        }
    }

    /// Chapter for a 1-based number key.
    pub fn from_number(n: usize) -> Option<Chapter> {
        n.checked_sub(1).and_then(|i| Chapter::ALL.get(i).copied())
    }

    pub fn title(self) -> &'static str {
        match self {
            Chapter::MacroTrend => "Prices vs Incomes (Macro Trend)",
            Chapter::MetroDivergence => "Metro Affordability Divergence",
            Chapter::AffordabilityBands => "Affordability Bands",
            Chapter::RentBurden => "Rent Burden vs Ownership Burden",
            Chapter::Snapshot => "Metro Snapshot",
        }
    }

    /// Short label for tabs.
    pub fn tab_label(self) -> &'static str {
        match self {
            Chapter::MacroTrend => "Macro",
            Chapter::MetroDivergence => "Divergence",
            Chapter::AffordabilityBands => "Bands",
            Chapter::RentBurden => "Rent",
            Chapter::Snapshot => "Snapshot",
        }
    }

    pub fn intro(self) -> &'static str {
        match self {
            Chapter::MacroTrend => {
                "Composite home prices and household incomes, both indexed to the first year = 100. \
                 When the lines separate, prices are growing faster than the incomes that pay for them."
            }
            Chapter::MetroDivergence => {
                "National averages hide how unevenly affordability moved. Metros are ranked by \
                 price-to-income (PTI = median sale price / household income estimate)."
            }
            Chapter::AffordabilityBands => {
                "PTI grouped into bands: Affordable <= 3.0, Moderately 3.0-4.0, Seriously 4.0-5.0, \
                 Severely 5.0-8.9, Impossibly > 8.9."
            }
            Chapter::RentBurden => {
                "Renting and buying carry very different burdens. Rent-to-income uses annual rent \
                 (12 x median rent) over the same household income estimate."
            }
            Chapter::Snapshot => "Every metro's PTI in the focus year, coloured by affordability band.",
        }
    }

    /// Reading notes shown after the chapter's tables.
    pub fn notes(self) -> &'static [&'static str] {
        match self {
            Chapter::MacroTrend => &[
                "Equal growth keeps both indices together.",
                "A widening gap means ownership is drifting out of reach.",
            ],
            Chapter::MetroDivergence => &[
                "Outliers at the top of the ranking pull the national average up.",
                "Compare whether cheap metros stayed cheap or caught up.",
            ],
            Chapter::AffordabilityBands => &[
                "Fewer metros stay Affordable over time while the upper bands fill.",
                "A steady drift across many metros is structural, not a local spike.",
            ],
            Chapter::RentBurden => &[
                "Rent burden moves slowly relative to income.",
                "The jump from renting to owning is where affordability breaks.",
            ],
            Chapter::Snapshot => &[
                "Metros at the top are the least affordable today.",
                "Bar colours map each metro to its band.",
            ],
        }
    }

    pub fn next(self) -> Chapter {
        Chapter::ALL[(self.index() + 1) % Chapter::ALL.len()]
    }

    pub fn prev(self) -> Chapter {
        Chapter::ALL[(self.index() + Chapter::ALL.len() - 1) % Chapter::ALL.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_wraps() {
        assert_eq!(Chapter::Snapshot.next(), Chapter::MacroTrend);
        assert_eq!(Chapter::MacroTrend.prev(), Chapter::Snapshot);
        assert_eq!(Chapter::MetroDivergence.next().prev(), Chapter::MetroDivergence);
    }

    #[test]
    fn number_keys_map_to_chapters() {
        assert_eq!(Chapter::from_number(1), Some(Chapter::MacroTrend));
        assert_eq!(Chapter::from_number(5), Some(Chapter::Snapshot));
        assert_eq!(Chapter::from_number(0), None);
        assert_eq!(Chapter::from_number(6), None);
        for c in Chapter::ALL {
            assert_eq!(Chapter::from_number(c.number()), Some(c));
        }
    }
}
