//! [`House`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        house::{self, equipment, resident, Equipment, Resident},
        House,
    },
    infra::{
        database::{
            self,
            postgres::{
                filter::{Dialect, Where},
                Connection,
            },
            Postgres,
        },
        Database,
    },
    read,
};

/// Builds a [`House`] out of a row holding `houses` and `equipment` columns.
fn house_from_row(row: &Row, residents: Option<Vec<Resident>>) -> House {
    let id = row.get("id");
    House {
        id,
        version: row.get("version"),
        hash: row.get("hash"),
        kind: row.get("kind"),
        num_floors: row.get("num_floors"),
        num_rooms: row.get("num_rooms"),
        price: row.get("price"),
        size: row.get("size"),
        location: row.get("location"),
        keywords: row.get("keywords"),
        equipment: Equipment {
            id: row.get("equipment_id"),
            house_id: id,
            basement: row.get("basement"),
            garden: row.get("garden"),
            garage: row.get("garage"),
        },
        residents,
    }
}

impl<C> Database<Select<By<Option<House>, read::house::Lookup>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<House>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<House>, read::house::Lookup>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::house::Lookup { id, with_residents } = by.into_inner();

        if !with_residents {
            const SQL: &str = "\
                SELECT h.id, h.version, h.hash, h.kind, \
                       h.num_floors, h.num_rooms, h.price, h.size, \
                       h.location, h.keywords, \
                       e.id AS equipment_id, e.basement, e.garden, e.garage \
                FROM houses AS h \
                INNER JOIN equipment AS e ON e.house_id = h.id \
                WHERE h.id = $1::INT4";
            return Ok(self
                .query_opt(SQL, &[&id])
                .await
                .map_err(tracerr::wrap!())?
                .map(|row| house_from_row(&row, None)));
        }

        const SQL: &str = "\
            SELECT h.id, h.version, h.hash, h.kind, \
                   h.num_floors, h.num_rooms, h.price, h.size, \
                   h.location, h.keywords, \
                   e.id AS equipment_id, e.basement, e.garden, e.garage, \
                   r.id AS resident_id, r.first_name, r.last_name, \
                   r.age, r.occupation \
            FROM houses AS h \
            INNER JOIN equipment AS e ON e.house_id = h.id \
            LEFT JOIN residents AS r ON r.house_id = h.id \
            WHERE h.id = $1::INT4 \
            ORDER BY r.id";
        let rows = self
            .query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?;
        let Some(first) = rows.first() else {
            return Ok(None);
        };

        let residents = rows
            .iter()
            .filter_map(|row| {
                let resident_id = row.get::<_, Option<resident::Id>>("resident_id")?;
                Some(Resident {
                    id: resident_id,
                    house_id: id,
                    first_name: row.get("first_name"),
                    last_name: row.get("last_name"),
                    age: row.get("age"),
                    occupation: row.get("occupation"),
                })
            })
            .collect();

        Ok(Some(house_from_row(first, Some(residents))))
    }
}

impl<C> Database<Select<By<Vec<House>, Option<read::house::list::Filter>>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<House>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<House>, Option<read::house::list::Filter>>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let clause = Where::render(filter.as_ref(), Dialect::Postgres);

        let sql = format!(
            "SELECT h.id, h.version, h.hash, h.kind, \
                    h.num_floors, h.num_rooms, h.price, h.size, \
                    h.location, h.keywords, \
                    e.id AS equipment_id, e.basement, e.garden, e.garage \
             FROM houses AS h \
             INNER JOIN equipment AS e ON e.house_id = h.id \
             {clause} \
             ORDER BY h.id",
            clause = clause.sql,
        );
        log::debug!(%sql, "searching houses");

        Ok(self
            .query(&sql, &clause.bindings())
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| house_from_row(row, None))
            .collect())
    }
}

impl<C> Database<Select<By<Option<house::Id>, house::Hash>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<house::Id>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<house::Id>, house::Hash>>,
    ) -> Result<Self::Ok, Self::Err> {
        let hash: house::Hash = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM houses \
            WHERE hash = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&hash])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| row.get("id")))
    }
}

impl<C> Database<Insert<house::Draft>> for Postgres<C>
where
    C: Connection,
{
    type Ok = house::Id;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(draft): Insert<house::Draft>,
    ) -> Result<Self::Ok, Self::Err> {
        let house::Draft {
            hash,
            kind,
            num_floors,
            num_rooms,
            price,
            size,
            location,
            keywords,
            equipment,
            residents,
        } = draft;

        const HOUSE_SQL: &str = "\
            INSERT INTO houses (\
                hash, kind, num_floors, num_rooms, price, size, \
                location, keywords\
            ) VALUES (\
                $1::UUID, $2::INT2, $3::INT2, $4::INT2, \
                $5::NUMERIC, $6::NUMERIC, \
                $7::VARCHAR, $8::VARCHAR\
            ) \
            RETURNING id";
        let id: house::Id = self
            .query(
                HOUSE_SQL,
                &[
                    &hash,
                    &kind,
                    &num_floors,
                    &num_rooms,
                    &price,
                    &size,
                    &location,
                    &keywords,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .first()
            .map(|row| row.get("id"))
            .ok_or_else(|| {
                tracerr::new!(database::Error::NothingReturned("houses"))
            })?;

        let equipment::Draft {
            basement,
            garden,
            garage,
        } = equipment;
        const EQUIPMENT_SQL: &str = "\
            INSERT INTO equipment (\
                house_id, basement, garden, garage, label\
            ) VALUES (\
                $1::INT4, $2::BOOL, $3::BOOL, $4::BOOL, $5::VARCHAR\
            )";
        _ = self
            .exec(
                EQUIPMENT_SQL,
                &[&id, &basement, &garden, &garage, &equipment.label()],
            )
            .await
            .map_err(tracerr::wrap!())?;

        const RESIDENT_SQL: &str = "\
            INSERT INTO residents (\
                house_id, first_name, last_name, age, occupation\
            ) VALUES (\
                $1::INT4, $2::VARCHAR, $3::VARCHAR, $4::INT2, $5::VARCHAR\
            )";
        for resident::Draft {
            first_name,
            last_name,
            age,
            occupation,
        } in &residents
        {
            _ = self
                .exec(
                    RESIDENT_SQL,
                    &[&id, first_name, last_name, age, occupation],
                )
                .await
                .map_err(tracerr::wrap!())?;
        }

        Ok(id)
    }
}

impl<C> Database<Update<House>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<house::Version>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(house): Update<House>,
    ) -> Result<Self::Ok, Self::Err> {
        let House {
            id,
            version,
            hash,
            kind,
            num_floors,
            num_rooms,
            price,
            size,
            location,
            keywords,
            equipment: _,
            residents: _,
        } = house;

        const SQL: &str = "\
            UPDATE houses \
            SET hash = $3::UUID, \
                kind = $4::INT2, \
                num_floors = $5::INT2, \
                num_rooms = $6::INT2, \
                price = $7::NUMERIC, \
                size = $8::NUMERIC, \
                location = $9::VARCHAR, \
                keywords = $10::VARCHAR, \
                version = version + 1 \
            WHERE id = $1::INT4 \
              AND version = $2::INT4 \
            RETURNING version";
        Ok(self
            .query_opt(
                SQL,
                &[
                    &id,
                    &version,
                    &hash,
                    &kind,
                    &num_floors,
                    &num_rooms,
                    &price,
                    &size,
                    &location,
                    &keywords,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| row.get("version")))
    }
}

impl<C> Database<Lock<By<House, house::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<House, house::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: house::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM houses \
            WHERE id = $1::INT4 \
            FOR UPDATE";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<House, house::Hash>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<House, house::Hash>>,
    ) -> Result<Self::Ok, Self::Err> {
        let key = by.into_inner().lock_key();

        const SQL: &str = "SELECT pg_advisory_xact_lock($1::INT8)";
        self.exec(SQL, &[&key])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
