//! In-memory [`Database`] for tests.

use std::sync::{Arc, Mutex, MutexGuard};

use common::operations::{By, Commit, Insert, Lock, Select, Transact, Update};
use tracerr::Traced;

use crate::{
    domain::{
        house::{self, equipment, resident, Equipment, Resident},
        House,
    },
    infra::{database, Database},
    read::house::{
        list::{Filter, Predicate, Value},
        Lookup,
    },
};

/// [`Database`] keeping [`House`]s in memory.
///
/// Transactions are not isolated: every write is visible immediately.
#[derive(Clone, Debug, Default)]
pub(crate) struct Memory(Arc<Mutex<State>>);

/// State of a [`Memory`] database.
#[derive(Debug, Default)]
struct State {
    /// Stored [`House`]s with all their [`Resident`]s, ordered by ID.
    houses: Vec<House>,

    /// Number of executed list selections.
    searches: usize,

    /// Last assigned ID, shared by all the tables.
    last_id: i32,
}

impl State {
    /// Assigns a new ID.
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }
}

impl Memory {
    /// Locks the [`State`] of this [`Memory`] database.
    fn state(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap()
    }

    /// Returns the number of list selections executed so far.
    pub(crate) fn searches(&self) -> usize {
        self.state().searches
    }

    /// Overwrites the persisted [`house::Version`] of a [`House`].
    pub(crate) fn set_version(&self, id: house::Id, version: house::Version) {
        let mut state = self.state();
        if let Some(h) = state.houses.iter_mut().find(|h| h.id == id) {
            h.version = version;
        }
    }
}

/// Checks whether the provided [`House`] satisfies the [`Predicate`].
fn satisfies(house: &House, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::EquipmentLike(text) => house
            .equipment
            .label()
            .to_lowercase()
            .contains(&text.to_lowercase()),
        Predicate::Tagged(flag) => house
            .keywords
            .joined()
            .is_some_and(|k| k.contains(flag.tag())),
        Predicate::Equals(value) => match value {
            Value::Id(v) => house.id == *v,
            Value::Version(v) => house.version == *v,
            Value::Kind(v) => house.kind == *v,
            Value::NumFloors(v) => house.num_floors == *v,
            Value::NumRooms(v) => house.num_rooms == *v,
            Value::Price(v) => house.price == *v,
            Value::Size(v) => house.size == *v,
            Value::Location(v) => house.location.as_ref() == Some(v),
            Value::Keywords(v) => house.keywords == *v,
        },
    }
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl<T> Database<Lock<By<House, T>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<House, T>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<House>, Lookup>>> for Memory {
    type Ok = Option<House>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<House>, Lookup>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Lookup { id, with_residents } = by.into_inner();
        Ok(self.state().houses.iter().find(|h| h.id == id).map(|h| {
            let mut house = h.clone();
            if !with_residents {
                house.residents = None;
            }
            house
        }))
    }
}

impl Database<Select<By<Vec<House>, Option<Filter>>>> for Memory {
    type Ok = Vec<House>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<House>, Option<Filter>>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let mut state = self.state();
        state.searches += 1;
        Ok(state
            .houses
            .iter()
            .filter(|h| {
                filter
                    .as_ref()
                    .is_none_or(|f| f.predicates().all(|p| satisfies(h, p)))
            })
            .map(|h| House {
                residents: None,
                ..h.clone()
            })
            .collect())
    }
}

impl Database<Select<By<Option<house::Id>, house::Hash>>> for Memory {
    type Ok = Option<house::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<house::Id>, house::Hash>>,
    ) -> Result<Self::Ok, Self::Err> {
        let hash = by.into_inner();
        Ok(self
            .state()
            .houses
            .iter()
            .find(|h| h.hash == hash)
            .map(|h| h.id))
    }
}

impl Database<Insert<house::Draft>> for Memory {
    type Ok = house::Id;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(draft): Insert<house::Draft>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        let id = house::Id::new(state.next_id()).unwrap();
        let equipment = Equipment {
            id: equipment::Id::new(state.next_id()).unwrap(),
            house_id: id,
            basement: draft.equipment.basement,
            garden: draft.equipment.garden,
            garage: draft.equipment.garage,
        };
        let residents = draft
            .residents
            .into_iter()
            .map(|r| Resident {
                id: resident::Id::new(state.next_id()).unwrap(),
                house_id: id,
                first_name: r.first_name,
                last_name: r.last_name,
                age: r.age,
                occupation: r.occupation,
            })
            .collect();
        state.houses.push(House {
            id,
            version: house::Version::default(),
            hash: draft.hash,
            kind: draft.kind,
            num_floors: draft.num_floors,
            num_rooms: draft.num_rooms,
            price: draft.price,
            size: draft.size,
            location: draft.location,
            keywords: draft.keywords,
            equipment,
            residents: Some(residents),
        });
        Ok(id)
    }
}

impl Database<Update<House>> for Memory {
    type Ok = Option<house::Version>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(house): Update<House>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        let Some(stored) = state
            .houses
            .iter_mut()
            .find(|h| h.id == house.id && h.version == house.version)
        else {
            return Ok(None);
        };

        let version = house::Version::from(i32::from(house.version) + 1);
        *stored = House {
            version,
            equipment: stored.equipment.clone(),
            residents: stored.residents.take(),
            ..house
        };
        Ok(Some(version))
    }
}
