//! Defines the route handler for the page that lists a user's transactions.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::Date;

use crate::{
    Error,
    auth::AccessToken,
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_unsigned_amount,
    },
    navigation::NavBar,
    transaction::{Transaction, TransactionType, category::category_name},
    upstream::UpstreamClient,
};

/// A transaction formatted for display in the transactions table.
#[derive(Debug, PartialEq)]
struct TransactionTableRow {
    amount: String,
    transaction_type: TransactionType,
    date: Date,
    description: String,
    category: &'static str,
    edit_url: String,
}

impl TransactionTableRow {
    fn new(transaction: &Transaction) -> Self {
        Self {
            amount: signed_amount(transaction.amount, transaction.transaction_type),
            transaction_type: transaction.transaction_type,
            date: transaction.date,
            description: transaction.description.clone().unwrap_or_default(),
            category: category_name(transaction.category_id),
            edit_url: format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, &transaction.id),
        }
    }
}

/// Format `cents` with the sign implied by `transaction_type`, e.g. "-12.30".
fn signed_amount(cents: i64, transaction_type: TransactionType) -> String {
    let sign = match transaction_type {
        TransactionType::Expense => "-",
        TransactionType::Income => "+",
    };

    format!("{sign}{}", format_unsigned_amount(cents))
}

fn amount_class(transaction_type: TransactionType) -> &'static str {
    match transaction_type {
        TransactionType::Expense => "text-red-700 dark:text-red-300",
        TransactionType::Income => "text-green-700 dark:text-green-300",
    }
}

/// Renders the page listing the user's transactions, newest first.
pub async fn get_transactions_page(
    State(upstream): State<UpstreamClient>,
    Extension(token): Extension<AccessToken>,
) -> Result<Response, Error> {
    let mut transactions = upstream
        .list_transactions(&token)
        .await
        .inspect_err(|error| tracing::error!("Failed to retrieve transactions: {error}"))?;

    transactions.sort_by(|a, b| b.date.cmp(&a.date));

    let rows: Vec<TransactionTableRow> =
        transactions.iter().map(TransactionTableRow::new).collect();

    Ok(transactions_view(&rows).into_response())
}

fn transactions_view(rows: &[TransactionTableRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="relative w-full max-w-screen-lg overflow-x-auto"
            {
                div class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                    {
                        "New Transaction"
                    }
                }

                @if rows.is_empty() {
                    p class="my-8 text-center" data-empty-state="true"
                    {
                        "Nothing here yet. "
                        a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                        {
                            "Add your first transaction"
                        }
                        " to get started."
                    }
                } @else {
                    table class="w-full my-2 text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (transaction_row_view(row))
                            }
                        }
                    }
                }
            }
        }
    };

    base("Transactions", &[], &content)
}

fn transaction_row_view(row: &TransactionTableRow) -> Markup {
    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-row="true"
        {
            td class=(TABLE_CELL_STYLE) { time datetime=(row.date) { (row.date) } }
            td class=(TABLE_CELL_STYLE) { (row.description) }
            td class=(TABLE_CELL_STYLE) { (row.category) }
            td class={ "px-6 py-4 text-right " (amount_class(row.transaction_type)) }
            {
                (row.amount)
            }
            td class=(TABLE_CELL_STYLE)
            {
                a href=(row.edit_url) class=(LINK_STYLE) { "Edit" }
            }
        }
    }
}
