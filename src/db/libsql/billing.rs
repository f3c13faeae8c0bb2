use libsql::params;
use uuid::Uuid;

use crate::db::{
    ContractRecord, ContractStore, CreateContractParams, CreateInvoiceItemParams,
    CreateInvoiceParams, CreateTestimonialParams, InvoiceItemRecord, InvoiceListEntry,
    InvoiceRecord, InvoiceStatus, InvoiceStore, TestimonialRecord, TestimonialStore,
};
use crate::error::DatabaseError;

use super::{
    LibSqlBackend, get_i64, get_opt_i64, get_opt_text, get_text, opt_date, opt_decimal, opt_i64,
    opt_text, opt_uuid, parse_decimal, parse_opt_date, parse_opt_decimal, parse_opt_uuid,
    parse_ts, parse_uuid,
};

const INVOICE_COLUMNS: &str = "i.id, i.user_id, i.client_id, i.project_id, i.invoice_number, \
     i.status, i.issue_date, i.due_date, i.subtotal, i.tax_rate, i.tax, i.total, i.notes, \
     i.terms, i.created_at, i.updated_at";

const CONTRACT_COLUMNS: &str = "id, user_id, client_id, project_id, title, content, value, \
     start_date, end_date, created_at, updated_at";

const TESTIMONIAL_COLUMNS: &str =
    "id, user_id, client_id, project_id, author_name, author_title, content, rating, created_at";

fn row_to_invoice_record(row: &libsql::Row) -> Result<InvoiceRecord, DatabaseError> {
    let status_raw = get_text(row, 5);
    Ok(InvoiceRecord {
        id: parse_uuid(&get_text(row, 0), "invoice.id")?,
        user_id: get_text(row, 1),
        client_id: parse_opt_uuid(get_opt_text(row, 2), "invoice.client_id")?,
        project_id: parse_opt_uuid(get_opt_text(row, 3), "invoice.project_id")?,
        invoice_number: get_text(row, 4),
        status: InvoiceStatus::from_db_value(&status_raw).ok_or_else(|| {
            DatabaseError::Serialization(format!("invalid invoice status '{}'", status_raw))
        })?,
        issue_date: parse_opt_date(get_opt_text(row, 6), "invoice.issue_date")?,
        due_date: parse_opt_date(get_opt_text(row, 7), "invoice.due_date")?,
        subtotal: parse_decimal(&get_text(row, 8), "invoice.subtotal")?,
        tax_rate: parse_decimal(&get_text(row, 9), "invoice.tax_rate")?,
        tax: parse_decimal(&get_text(row, 10), "invoice.tax")?,
        total: parse_decimal(&get_text(row, 11), "invoice.total")?,
        notes: get_opt_text(row, 12),
        terms: get_opt_text(row, 13),
        created_at: parse_ts(&get_text(row, 14))?,
        updated_at: parse_ts(&get_text(row, 15))?,
    })
}

fn row_to_invoice_item(row: &libsql::Row) -> Result<InvoiceItemRecord, DatabaseError> {
    Ok(InvoiceItemRecord {
        id: parse_uuid(&get_text(row, 0), "invoice_item.id")?,
        invoice_id: parse_uuid(&get_text(row, 1), "invoice_item.invoice_id")?,
        description: get_text(row, 2),
        quantity: parse_decimal(&get_text(row, 3), "invoice_item.quantity")?,
        unit_price: parse_decimal(&get_text(row, 4), "invoice_item.unit_price")?,
        amount: parse_decimal(&get_text(row, 5), "invoice_item.amount")?,
        sort_order: i32::try_from(get_i64(row, 6))
            .map_err(|_| DatabaseError::Serialization("invalid sort order".to_string()))?,
    })
}

fn row_to_contract_record(row: &libsql::Row) -> Result<ContractRecord, DatabaseError> {
    Ok(ContractRecord {
        id: parse_uuid(&get_text(row, 0), "contract.id")?,
        user_id: get_text(row, 1),
        client_id: parse_opt_uuid(get_opt_text(row, 2), "contract.client_id")?,
        project_id: parse_opt_uuid(get_opt_text(row, 3), "contract.project_id")?,
        title: get_text(row, 4),
        content: get_text(row, 5),
        value: parse_opt_decimal(get_opt_text(row, 6), "contract.value")?,
        start_date: parse_opt_date(get_opt_text(row, 7), "contract.start_date")?,
        end_date: parse_opt_date(get_opt_text(row, 8), "contract.end_date")?,
        created_at: parse_ts(&get_text(row, 9))?,
        updated_at: parse_ts(&get_text(row, 10))?,
    })
}

fn row_to_testimonial_record(row: &libsql::Row) -> Result<TestimonialRecord, DatabaseError> {
    Ok(TestimonialRecord {
        id: parse_uuid(&get_text(row, 0), "testimonial.id")?,
        user_id: get_text(row, 1),
        client_id: parse_opt_uuid(get_opt_text(row, 2), "testimonial.client_id")?,
        project_id: parse_opt_uuid(get_opt_text(row, 3), "testimonial.project_id")?,
        author_name: get_text(row, 4),
        author_title: get_opt_text(row, 5),
        content: get_text(row, 6),
        rating: get_opt_i64(row, 7).and_then(|value| u8::try_from(value).ok()),
        created_at: parse_ts(&get_text(row, 8))?,
    })
}

fn require_text<'a>(value: &'a str, what: &str) -> Result<&'a str, DatabaseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DatabaseError::Validation(format!(
            "{} cannot be empty",
            what
        )));
    }
    Ok(trimmed)
}

impl LibSqlBackend {
    /// Reject client/project references the owner cannot see.
    async fn ensure_references_owned(
        &self,
        user_id: &str,
        client_id: Option<Uuid>,
        project_id: Option<Uuid>,
    ) -> Result<(), DatabaseError> {
        let conn = self.connect().await?;
        if let Some(client_id) = client_id {
            let found = conn
                .query(
                    "SELECT 1 FROM clients WHERE user_id = ?1 AND id = ?2 LIMIT 1",
                    params![user_id, client_id.to_string()],
                )
                .await?
                .next()
                .await?;
            if found.is_none() {
                return Err(DatabaseError::NotFound {
                    entity: "client".to_string(),
                    id: client_id.to_string(),
                });
            }
        }
        if let Some(project_id) = project_id {
            let found = conn
                .query(
                    "SELECT 1 FROM projects WHERE user_id = ?1 AND id = ?2 LIMIT 1",
                    params![user_id, project_id.to_string()],
                )
                .await?
                .next()
                .await?;
            if found.is_none() {
                return Err(DatabaseError::NotFound {
                    entity: "project".to_string(),
                    id: project_id.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl InvoiceStore for LibSqlBackend {
    async fn create_invoice(
        &self,
        user_id: &str,
        invoice: &CreateInvoiceParams,
        items: &[CreateInvoiceItemParams],
    ) -> Result<(InvoiceRecord, Vec<InvoiceItemRecord>), DatabaseError> {
        let invoice_number = require_text(&invoice.invoice_number, "invoice number")?;
        self.ensure_references_owned(user_id, invoice.client_id, invoice.project_id)
            .await?;

        let conn = self.connect().await?;
        let id = Uuid::new_v4();
        conn.execute("BEGIN", ()).await?;
        let insert_result = async {
            conn.execute(
                "INSERT INTO invoices (id, user_id, client_id, project_id, invoice_number, status, \
                 issue_date, due_date, subtotal, tax_rate, tax, total, notes, terms) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                params![
                    id.to_string(),
                    user_id,
                    opt_uuid(invoice.client_id),
                    opt_uuid(invoice.project_id),
                    invoice_number,
                    invoice.status.as_str(),
                    opt_date(invoice.issue_date),
                    opt_date(invoice.due_date),
                    invoice.subtotal.to_string(),
                    invoice.tax_rate.to_string(),
                    invoice.tax.to_string(),
                    invoice.total.to_string(),
                    opt_text(invoice.notes.as_deref()),
                    opt_text(invoice.terms.as_deref()),
                ],
            )
            .await?;

            for item in items {
                conn.execute(
                    "INSERT INTO invoice_items (id, invoice_id, description, quantity, unit_price, amount, sort_order) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        Uuid::new_v4().to_string(),
                        id.to_string(),
                        item.description.as_str(),
                        item.quantity.to_string(),
                        item.unit_price.to_string(),
                        item.amount.to_string(),
                        i64::from(item.sort_order),
                    ],
                )
                .await?;
            }
            Ok::<(), DatabaseError>(())
        }
        .await;

        match insert_result {
            Ok(()) => {
                conn.execute("COMMIT", ()).await?;
            }
            Err(err) => {
                let _ = conn.execute("ROLLBACK", ()).await;
                return Err(err);
            }
        }

        let record = self
            .get_invoice(user_id, id)
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load created invoice".to_string()))?;
        let items = self.list_invoice_items(user_id, id).await?;
        Ok((record, items))
    }

    async fn list_invoices(&self, user_id: &str) -> Result<Vec<InvoiceListEntry>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {INVOICE_COLUMNS}, c.name FROM invoices i \
                     LEFT JOIN clients c ON c.id = i.client_id \
                     WHERE i.user_id = ?1 ORDER BY i.created_at DESC, i.rowid DESC"
                ),
                params![user_id],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(InvoiceListEntry {
                invoice: row_to_invoice_record(&row)?,
                client_name: get_opt_text(&row, 16),
            });
        }
        Ok(out)
    }

    async fn get_invoice(
        &self,
        user_id: &str,
        invoice_id: Uuid,
    ) -> Result<Option<InvoiceRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!(
                    "SELECT {INVOICE_COLUMNS} FROM invoices i WHERE i.user_id = ?1 AND i.id = ?2 LIMIT 1"
                ),
                params![user_id, invoice_id.to_string()],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_invoice_record(&row)).transpose()
    }

    async fn list_invoice_items(
        &self,
        user_id: &str,
        invoice_id: Uuid,
    ) -> Result<Vec<InvoiceItemRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                "SELECT it.id, it.invoice_id, it.description, it.quantity, it.unit_price, it.amount, it.sort_order \
                 FROM invoice_items it JOIN invoices i ON i.id = it.invoice_id \
                 WHERE i.user_id = ?1 AND it.invoice_id = ?2 \
                 ORDER BY it.sort_order ASC, it.rowid ASC",
                params![user_id, invoice_id.to_string()],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_invoice_item(&row)?);
        }
        Ok(out)
    }

    async fn set_invoice_status(
        &self,
        user_id: &str,
        invoice_id: Uuid,
        status: InvoiceStatus,
    ) -> Result<Option<InvoiceRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let updated = conn
            .execute(
                "UPDATE invoices SET status = ?3, updated_at = datetime('now') \
                 WHERE user_id = ?1 AND id = ?2",
                params![user_id, invoice_id.to_string(), status.as_str()],
            )
            .await?;
        if updated == 0 {
            return Ok(None);
        }
        self.get_invoice(user_id, invoice_id).await
    }

    async fn delete_invoice(
        &self,
        user_id: &str,
        invoice_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        conn.execute("BEGIN", ()).await?;
        let delete_result = async {
            conn.execute(
                "DELETE FROM invoice_items WHERE invoice_id = ?2 \
                 AND invoice_id IN (SELECT id FROM invoices WHERE user_id = ?1)",
                params![user_id, invoice_id.to_string()],
            )
            .await?;
            let deleted = conn
                .execute(
                    "DELETE FROM invoices WHERE user_id = ?1 AND id = ?2",
                    params![user_id, invoice_id.to_string()],
                )
                .await?;
            Ok::<bool, DatabaseError>(deleted > 0)
        }
        .await;

        match delete_result {
            Ok(deleted) => {
                conn.execute("COMMIT", ()).await?;
                Ok(deleted)
            }
            Err(err) => {
                let _ = conn.execute("ROLLBACK", ()).await;
                Err(err)
            }
        }
    }

    async fn detach_invoices_from_project(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect().await?;
        let updated = conn
            .execute(
                "UPDATE invoices SET project_id = NULL, updated_at = datetime('now') \
                 WHERE user_id = ?1 AND project_id = ?2",
                params![user_id, project_id.to_string()],
            )
            .await?;
        Ok(updated)
    }
}

#[async_trait::async_trait]
impl ContractStore for LibSqlBackend {
    async fn create_contract(
        &self,
        user_id: &str,
        input: &CreateContractParams,
    ) -> Result<ContractRecord, DatabaseError> {
        let title = require_text(&input.title, "contract title")?;
        self.ensure_references_owned(user_id, input.client_id, input.project_id)
            .await?;

        let conn = self.connect().await?;
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO contracts (id, user_id, client_id, project_id, title, content, value, start_date, end_date) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id.to_string(),
                user_id,
                opt_uuid(input.client_id),
                opt_uuid(input.project_id),
                title,
                input.content.as_str(),
                opt_decimal(input.value),
                opt_date(input.start_date),
                opt_date(input.end_date),
            ],
        )
        .await?;

        self.get_contract(user_id, id)
            .await?
            .ok_or_else(|| DatabaseError::Query("failed to load created contract".to_string()))
    }

    async fn list_contracts(&self, user_id: &str) -> Result<Vec<ContractRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE user_id = ?1 \
                     ORDER BY created_at DESC, rowid DESC"
                ),
                params![user_id],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_contract_record(&row)?);
        }
        Ok(out)
    }

    async fn get_contract(
        &self,
        user_id: &str,
        contract_id: Uuid,
    ) -> Result<Option<ContractRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let row = conn
            .query(
                &format!(
                    "SELECT {CONTRACT_COLUMNS} FROM contracts WHERE user_id = ?1 AND id = ?2 LIMIT 1"
                ),
                params![user_id, contract_id.to_string()],
            )
            .await?
            .next()
            .await?;
        row.map(|row| row_to_contract_record(&row)).transpose()
    }

    async fn delete_contract(
        &self,
        user_id: &str,
        contract_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute(
                "DELETE FROM contracts WHERE user_id = ?1 AND id = ?2",
                params![user_id, contract_id.to_string()],
            )
            .await?;
        Ok(deleted > 0)
    }

    async fn detach_contracts_from_project(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect().await?;
        let updated = conn
            .execute(
                "UPDATE contracts SET project_id = NULL, updated_at = datetime('now') \
                 WHERE user_id = ?1 AND project_id = ?2",
                params![user_id, project_id.to_string()],
            )
            .await?;
        Ok(updated)
    }
}

#[async_trait::async_trait]
impl TestimonialStore for LibSqlBackend {
    async fn create_testimonial(
        &self,
        user_id: &str,
        input: &CreateTestimonialParams,
    ) -> Result<TestimonialRecord, DatabaseError> {
        let author = require_text(&input.author_name, "author name")?;
        let content = require_text(&input.content, "testimonial content")?;
        if let Some(rating) = input.rating
            && !(1..=5).contains(&rating)
        {
            return Err(DatabaseError::Validation(format!(
                "rating must be between 1 and 5, got {}",
                rating
            )));
        }
        self.ensure_references_owned(user_id, input.client_id, input.project_id)
            .await?;

        let conn = self.connect().await?;
        let id = Uuid::new_v4();
        conn.execute(
            "INSERT INTO testimonials (id, user_id, client_id, project_id, author_name, author_title, content, rating) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id.to_string(),
                user_id,
                opt_uuid(input.client_id),
                opt_uuid(input.project_id),
                author,
                opt_text(input.author_title.as_deref()),
                content,
                opt_i64(input.rating.map(i64::from)),
            ],
        )
        .await?;

        let row = conn
            .query(
                &format!("SELECT {TESTIMONIAL_COLUMNS} FROM testimonials WHERE id = ?1 LIMIT 1"),
                params![id.to_string()],
            )
            .await?
            .next()
            .await?
            .ok_or_else(|| {
                DatabaseError::Query("failed to load created testimonial".to_string())
            })?;
        row_to_testimonial_record(&row)
    }

    async fn list_testimonials(
        &self,
        user_id: &str,
    ) -> Result<Vec<TestimonialRecord>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {TESTIMONIAL_COLUMNS} FROM testimonials WHERE user_id = ?1 \
                     ORDER BY created_at DESC, rowid DESC"
                ),
                params![user_id],
            )
            .await?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(row_to_testimonial_record(&row)?);
        }
        Ok(out)
    }

    async fn delete_testimonial(
        &self,
        user_id: &str,
        testimonial_id: Uuid,
    ) -> Result<bool, DatabaseError> {
        let conn = self.connect().await?;
        let deleted = conn
            .execute(
                "DELETE FROM testimonials WHERE user_id = ?1 AND id = ?2",
                params![user_id, testimonial_id.to_string()],
            )
            .await?;
        Ok(deleted > 0)
    }

    async fn detach_testimonials_from_project(
        &self,
        user_id: &str,
        project_id: Uuid,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connect().await?;
        let updated = conn
            .execute(
                "UPDATE testimonials SET project_id = NULL WHERE user_id = ?1 AND project_id = ?2",
                params![user_id, project_id.to_string()],
            )
            .await?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use crate::db::libsql::test_support::setup_backend;
    use crate::db::{
        ClientStore, ContractStore, CreateClientParams, CreateContractParams,
        CreateInvoiceItemParams, CreateInvoiceParams, CreateProjectParams,
        CreateTestimonialParams, InvoiceStatus, InvoiceStore, ProjectStore, TestimonialStore,
    };
    use crate::error::DatabaseError;

    fn invoice(number: &str) -> CreateInvoiceParams {
        CreateInvoiceParams {
            client_id: None,
            project_id: None,
            invoice_number: number.to_string(),
            status: InvoiceStatus::Draft,
            issue_date: None,
            due_date: None,
            subtotal: dec!(300.00),
            tax_rate: dec!(10),
            tax: dec!(30.00),
            total: dec!(330.00),
            notes: None,
            terms: Some("Net 30".to_string()),
        }
    }

    fn item(description: &str, sort_order: i32) -> CreateInvoiceItemParams {
        CreateInvoiceItemParams {
            description: description.to_string(),
            quantity: dec!(2),
            unit_price: dec!(75.00),
            amount: dec!(150.00),
            sort_order,
        }
    }

    #[tokio::test]
    async fn invoice_items_persist_in_order_and_delete_with_invoice() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        let (record, items) = store
            .create_invoice(
                "u1",
                &invoice("INV-001"),
                &[item("Design", 1), item("Discovery", 0)],
            )
            .await
            .expect("create invoice");
        assert_eq!(record.total, dec!(330.00));
        let descriptions: Vec<&str> = items.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(descriptions, vec!["Discovery", "Design"]);

        assert!(store.delete_invoice("u1", record.id).await.expect("delete"));
        assert!(store.get_invoice("u1", record.id).await.expect("get").is_none());
        assert!(
            store
                .list_invoice_items("u1", record.id)
                .await
                .expect("items")
                .is_empty()
        );
    }

    #[tokio::test]
    async fn invoice_numbers_are_unique_per_owner() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        store
            .create_invoice("u1", &invoice("INV-7"), &[])
            .await
            .expect("first");
        store
            .create_invoice("u2", &invoice("INV-7"), &[])
            .await
            .expect("other owner may reuse the number");
        let err = store
            .create_invoice("u1", &invoice("INV-7"), &[item("dup", 0)])
            .await
            .expect_err("duplicate number");
        assert!(matches!(err, DatabaseError::Constraint(_)), "got {err:?}");
        assert_eq!(store.list_invoices("u1").await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn list_invoices_joins_client_name() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        let client = store
            .create_client(
                "u1",
                &CreateClientParams {
                    name: "Umbrella".to_string(),
                    ..Default::default()
                },
            )
            .await
            .expect("client");
        let mut params = invoice("INV-100");
        params.client_id = Some(client.id);
        store.create_invoice("u1", &params, &[]).await.expect("create");

        let listed = store.list_invoices("u1").await.expect("list");
        assert_eq!(listed[0].client_name.as_deref(), Some("Umbrella"));
    }

    #[tokio::test]
    async fn detach_helpers_null_project_references() {
        let fixture = setup_backend().await;
        let store = &fixture.backend;

        let project = store
            .create_project("u1", &CreateProjectParams::named("Launch"))
            .await
            .expect("project");
        let mut params = invoice("INV-9");
        params.project_id = Some(project.id);
        let (inv, _) = store.create_invoice("u1", &params, &[]).await.expect("invoice");
        let contract = store
            .create_contract(
                "u1",
                &CreateContractParams {
                    client_id: None,
                    project_id: Some(project.id),
                    title: "MSA".to_string(),
                    content: "Terms".to_string(),
                    value: Some(dec!(5000)),
                    start_date: None,
                    end_date: None,
                },
            )
            .await
            .expect("contract");
        store
            .create_testimonial(
                "u1",
                &CreateTestimonialParams {
                    client_id: None,
                    project_id: Some(project.id),
                    author_name: "Lee".to_string(),
                    author_title: None,
                    content: "Great work".to_string(),
                    rating: Some(5),
                },
            )
            .await
            .expect("testimonial");

        assert_eq!(
            store
                .detach_invoices_from_project("u2", project.id)
                .await
                .expect("foreign detach"),
            0
        );
        assert_eq!(
            store
                .detach_invoices_from_project("u1", project.id)
                .await
                .expect("detach"),
            1
        );
        assert_eq!(
            store
                .detach_contracts_from_project("u1", project.id)
                .await
                .expect("detach"),
            1
        );
        assert_eq!(
            store
                .detach_testimonials_from_project("u1", project.id)
                .await
                .expect("detach"),
            1
        );

        let inv = store.get_invoice("u1", inv.id).await.expect("get").expect("exists");
        assert_eq!(inv.project_id, None);
        let contract = store
            .get_contract("u1", contract.id)
            .await
            .expect("get")
            .expect("exists");
        assert_eq!(contract.project_id, None);
        let testimonials = store.list_testimonials("u1").await.expect("list");
        assert_eq!(testimonials[0].project_id, None);
    }

    #[tokio::test]
    async fn testimonial_rating_out_of_range_is_rejected() {
        let fixture = setup_backend().await;
        let err = fixture
            .backend
            .create_testimonial(
                "u1",
                &CreateTestimonialParams {
                    client_id: None,
                    project_id: None,
                    author_name: "Sam".to_string(),
                    author_title: None,
                    content: "ok".to_string(),
                    rating: Some(6),
                },
            )
            .await
            .expect_err("rating 6");
        assert!(matches!(err, DatabaseError::Validation(_)));
    }
}
