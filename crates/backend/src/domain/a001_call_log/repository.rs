use contracts::domain::a001_call_log::aggregate::CallLogRecord;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

/// Сколько пар ключей проверять одним запросом (по 2 параметра на пару)
const LOOKUP_CHUNK: usize = 200;

/// Сколько строк вставлять одним INSERT (по 5 параметров на строку)
const INSERT_CHUNK: usize = 500;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "a001_call_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub date_time: String,
    pub duration: f64,
    pub name: String,
    pub phone_number: String,
    pub call_type: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CallLogRecord {
    fn from(m: Model) -> Self {
        CallLogRecord {
            date_time: m.date_time,
            duration: m.duration,
            name: m.name,
            phone_number: m.phone_number,
            call_type: m.call_type,
        }
    }
}

fn to_active(record: &CallLogRecord) -> ActiveModel {
    ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        date_time: Set(record.date_time.clone()),
        duration: Set(record.duration),
        name: Set(record.name.clone()),
        phone_number: Set(record.phone_number.clone()),
        call_type: Set(record.call_type.clone()),
    }
}

/// Хранилище журнала звонков.
///
/// Создаётся один раз при старте и передаётся в обработчики через state.
#[derive(Clone, Debug)]
pub struct CallLogStore {
    conn: DatabaseConnection,
}

impl CallLogStore {
    pub fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Все записи, у которых пара (phoneNumber, dateTime) совпадает с любой из переданных
    pub async fn find_matching_any(
        &self,
        pairs: &[(String, String)],
    ) -> Result<Vec<CallLogRecord>, DbErr> {
        let mut found = Vec::new();
        for chunk in pairs.chunks(LOOKUP_CHUNK) {
            let condition = chunk
                .iter()
                .fold(Condition::any(), |cond, (phone_number, date_time)| {
                    cond.add(
                        Condition::all()
                            .add(Column::PhoneNumber.eq(phone_number.as_str()))
                            .add(Column::DateTime.eq(date_time.as_str())),
                    )
                });

            let models = Entity::find().filter(condition).all(&self.conn).await?;
            found.extend(models.into_iter().map(CallLogRecord::from));
        }
        Ok(found)
    }

    /// Вставить все записи одной транзакцией, вернуть количество вставленных.
    ///
    /// Записи с ключом, который уже есть в таблице (например, его успел
    /// вставить параллельный запрос), пропускаются и не считаются.
    pub async fn insert_many(&self, records: &[CallLogRecord]) -> Result<u64, DbErr> {
        if records.is_empty() {
            return Ok(0);
        }

        let txn = self.conn.begin().await?;
        let mut inserted = 0;
        for chunk in records.chunks(INSERT_CHUNK) {
            let result = Entity::insert_many(chunk.iter().map(to_active))
                .on_conflict(
                    OnConflict::columns([Column::PhoneNumber, Column::DateTime])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await;
            match result {
                Ok(rows) => inserted += rows,
                Err(e) => {
                    txn.rollback().await?;
                    return Err(e);
                }
            }
        }
        txn.commit().await?;

        Ok(inserted)
    }

    /// Все записи, новые сверху (сортировка по строке dateTime)
    pub async fn list_sorted_by_date_time_desc(&self) -> Result<Vec<CallLogRecord>, DbErr> {
        let records = Entity::find()
            .order_by_desc(Column::DateTime)
            .order_by_desc(Column::Id)
            .all(&self.conn)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(records)
    }

    pub async fn count(&self) -> Result<u64, DbErr> {
        Entity::find().count(&self.conn).await
    }
}
