//! Record-by-record bulk import.

use shelf_csv::{BookRecord, ChunkedReader};
use shelf_db::connection::{DbConnection, DbTransaction};
use shelf_db::store::{self, Association, Lookup, NewBook};

use crate::stats::ImportStats;
use crate::Result;

/// Bulk importer over an open catalog connection.
///
/// Each record runs in its own transaction, committed after its
/// association links are written. Database errors roll the record back and
/// the run moves on with the next row.
pub struct Importer {
    connection: DbConnection,
}

impl Importer {
    pub fn new(connection: DbConnection) -> Self {
        Self { connection }
    }

    /// Drain the reader and import every record it yields.
    pub async fn run<R: std::io::Read>(
        &self,
        reader: &mut ChunkedReader<R>,
    ) -> Result<ImportStats> {
        let mut stats = ImportStats::new();
        let mut row = 0usize;

        while let Some(chunk) = reader.next_chunk() {
            tracing::debug!(rows = chunk.len(), "processing chunk");
            for item in chunk {
                row += 1;
                stats.received += 1;

                let record = match item {
                    Ok(record) => record,
                    Err(err) => {
                        stats.failed += 1;
                        tracing::warn!(row, error = %err, "unreadable row skipped");
                        continue;
                    }
                };

                match self.import_record(&record).await {
                    Ok(links) => {
                        stats.imported += 1;
                        stats.links_written += links;
                    }
                    Err(err) => {
                        stats.failed += 1;
                        tracing::warn!(row, title = %record.title, error = %err,
                            "record rolled back, continuing with next row");
                    }
                }
            }
        }

        tracing::info!(
            received = stats.received,
            imported = stats.imported,
            failed = stats.failed,
            links = stats.links_written,
            "import finished"
        );
        Ok(stats)
    }

    /// Import one record inside its own transaction.
    ///
    /// Returns the number of association rows written.
    async fn import_record(&self, record: &BookRecord) -> Result<usize> {
        let tx = self.connection.begin_transaction().await?;
        match write_record(&tx, record).await {
            Ok(links) => {
                tx.commit().await?;
                Ok(links)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "record rollback failed");
                }
                Err(err)
            }
        }
    }
}

/// Steps 1-5 for one record, in strict sequence: language, publisher, book
/// row, author links, category links.
async fn write_record(tx: &DbTransaction, record: &BookRecord) -> Result<usize> {
    let language_id = match non_empty(record.language.as_deref()) {
        Some(name) => Some(store::get_or_create(tx, Lookup::Language, name).await?),
        None => None,
    };
    let publisher_id = match non_empty(record.publisher.as_deref()) {
        Some(name) => Some(store::get_or_create(tx, Lookup::Publisher, name).await?),
        None => None,
    };

    let book = NewBook {
        title: record.title.clone(),
        language_id,
        maturity_rating: record.maturity_rating.clone(),
        publisher_id,
        published_date: record.published_date()?,
        page_count: record.page_count,
    };
    let book_id = store::insert_book(tx, &book).await?;

    let mut links = 0usize;
    links += link_names(tx, record.author_names(), Association::Authors, book_id, record).await?;
    links +=
        link_names(tx, record.category_names(), Association::Categories, book_id, record).await?;
    Ok(links)
}

/// Resolve and link one list-literal column.
///
/// A malformed literal skips linking for that column only: the book row is
/// kept and the record still commits (list syntax is a source defect, not a
/// database failure).
async fn link_names(
    tx: &DbTransaction,
    names: shelf_csv::Result<Vec<String>>,
    association: Association,
    book_id: i64,
    record: &BookRecord,
) -> Result<usize> {
    let names = match names {
        Ok(names) => names,
        Err(err) => {
            tracing::warn!(title = %record.title, error = %err,
                "malformed list literal, links skipped");
            return Ok(0);
        }
    };

    let mut ids = Vec::with_capacity(names.len());
    for name in &names {
        ids.push(store::get_or_create(tx, association.lookup(), name).await?);
    }

    store::link(tx, association, book_id, &ids).await.map_err(Into::into)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|name| !name.trim().is_empty())
}
