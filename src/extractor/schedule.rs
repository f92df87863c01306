use serde::ser::{Serialize, Serializer};
use tracing::debug;

use crate::document::Document;

use super::assemble::assemble;
use super::entity::{Flavor, Hints};
use super::label::Weekday;
use super::{Context, Engine, EntityRecord};

/// Seven day buckets, Monday first. Every bucket is always present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleGroup {
    days: [Vec<EntityRecord>; 7],
}

impl ScheduleGroup {
    #[cfg(test)]
    pub fn day(&self, day: Weekday) -> &[EntityRecord] {
        &self.days[day.index()]
    }

    pub fn set(&mut self, day: Weekday, records: Vec<EntityRecord>) {
        self.days[day.index()] = records;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &[EntityRecord])> {
        Weekday::ALL
            .into_iter()
            .map(|day| (day, self.days[day.index()].as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(Vec::is_empty)
    }
}

impl Serialize for ScheduleGroup {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Day<'a> {
            day: Weekday,
            anime_list: &'a [EntityRecord],
        }

        #[derive(serde::Serialize)]
        struct Days<'a> {
            days: Vec<Day<'a>>,
        }

        Days {
            days: self
                .iter()
                .map(|(day, anime_list)| Day { day, anime_list })
                .collect(),
        }
        .serialize(serializer)
    }
}

impl Engine {
    /// Groups the release schedule by weekday.
    ///
    /// Each day is located and assembled on its own; a title may appear under several days.
    pub fn schedule(&self, doc: &Document, ctx: &Context<'_>) -> ScheduleGroup {
        let schema = &self.schema;
        let root = doc.find(&schema.schedule_root).unwrap_or_else(|| doc.root());
        let hints = Hints::new(Flavor::Scheduled);
        let mut group = ScheduleGroup::default();

        for day in Weekday::ALL {
            let label = day.label();

            let Some(container) = self.locator.locate(root, &label) else {
                debug!(%day, "No schedule section found");
                continue;
            };

            let mut candidates = container
                .select(&schema.schedule_item)
                .filter(|node| node.contains(&schema.item_link))
                .collect::<Vec<_>>();

            if candidates.is_empty() && container.contains(&schema.item_link) {
                candidates.push(container);
            }

            let records = assemble(day.as_str(), candidates, |node| {
                self.entities.extract(node, ctx, hints)
            });
            group.set(day, records);
        }

        if group.is_empty() {
            debug!("The schedule page has no recognizable day sections");
        }

        group
    }
}
