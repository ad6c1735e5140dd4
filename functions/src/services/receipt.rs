// nueats/functions/src/services/receipt.rs

//! Receipts for completed orders.
//!
//! [`Receipt::build`] does the arithmetic; [`render_pdf`] lays the result out on
//! A4 pages, continuing onto further pages for long orders. The grand total is
//! the order's stored `total_amount`, never a recomputation, so the receipt
//! always agrees with what was charged.

use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::{AppError, Result as AppResult};
use crate::models::{Order, OrderLine};

pub const TAX_LABEL: &str = "VAT 0%";

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptLine {
  pub name: String,
  pub quantity: i32,
  pub unit_price: Decimal,
  pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct Receipt {
  pub order_id: i64,
  pub issued_at: DateTime<Utc>,
  pub currency: String,
  pub lines: Vec<ReceiptLine>,
  pub subtotal: Decimal,
  pub tax_label: String,
  pub tax: Decimal,
  pub total: Decimal,
}

impl Receipt {
  pub fn build(order: &Order, lines: &[OrderLine], currency: &str, issued_at: DateTime<Utc>) -> Self {
    let lines: Vec<ReceiptLine> = lines
      .iter()
      .map(|line| ReceiptLine {
        name: line.name.clone(),
        quantity: line.quantity,
        unit_price: line.unit_price,
        line_total: line.line_total(),
      })
      .collect();
    let subtotal = lines.iter().map(|l| l.line_total).sum();

    Self {
      order_id: order.id,
      issued_at,
      currency: currency.to_string(),
      lines,
      subtotal,
      tax_label: TAX_LABEL.to_string(),
      tax: Decimal::ZERO,
      total: order.total_amount,
    }
  }

  pub fn filename(&self) -> String {
    format!("receipt-{}.pdf", self.order_id)
  }

  fn money(&self, amount: Decimal) -> String {
    format!("{} {:.2}", self.currency, amount.round_dp(2))
  }
}

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const TOP: i64 = PAGE_HEIGHT - 70;
const BOTTOM_MARGIN: i64 = 60;
const LEFT: i64 = 50;
const QTY_COLUMN: i64 = 300;
const PRICE_COLUMN: i64 = 360;
const TOTAL_COLUMN: i64 = 460;
const LINE_HEIGHT: i64 = 16;
/// Room kept under the last item row for the summary block and closing line.
const SUMMARY_HEIGHT: i64 = 4 * LINE_HEIGHT + 50;

/// Lays text out top-down, opening a new page whenever the next row would
/// fall below the bottom margin.
struct PageWriter {
  pages: Vec<Vec<Operation>>,
  ops: Vec<Operation>,
  y: i64,
}

impl PageWriter {
  fn new() -> Self {
    Self {
      pages: Vec::new(),
      ops: Vec::new(),
      y: TOP,
    }
  }

  fn text_at(&mut self, font: &str, size: i64, x: i64, text: &str) {
    self.ops.push(Operation::new("BT", vec![]));
    self.ops.push(Operation::new(
      "Tf",
      vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)],
    ));
    self.ops.push(Operation::new("Td", vec![Object::Integer(x), Object::Integer(self.y)]));
    self.ops.push(Operation::new("Tj", vec![Object::string_literal(text)]));
    self.ops.push(Operation::new("ET", vec![]));
  }

  fn rule_at(&mut self, y: i64) {
    self.ops.push(Operation::new("m", vec![Object::Integer(LEFT), Object::Integer(y)]));
    self.ops.push(Operation::new("l", vec![Object::Integer(PAGE_WIDTH - LEFT), Object::Integer(y)]));
    self.ops.push(Operation::new("S", vec![]));
  }

  fn column_headers(&mut self) {
    self.text_at("F2", 11, LEFT, "Item");
    self.text_at("F2", 11, QTY_COLUMN, "Qty");
    self.text_at("F2", 11, PRICE_COLUMN, "Unit price");
    self.text_at("F2", 11, TOTAL_COLUMN, "Amount");
    self.y -= 6;
    self.rule_at(self.y);
    self.y -= LINE_HEIGHT;
  }

  /// Starts a continuation page unless `height` still fits above the margin.
  fn ensure_room(&mut self, height: i64, order_id: i64) {
    if self.y - height >= BOTTOM_MARGIN {
      return;
    }
    self.pages.push(std::mem::take(&mut self.ops));
    self.y = TOP;
    self.text_at("F1", 11, LEFT, &format!("Order #{} (continued)", order_id));
    self.y -= 28;
    self.column_headers();
  }

  fn finish(mut self) -> Vec<Vec<Operation>> {
    self.pages.push(self.ops);
    self.pages
  }
}

/// Operations for each page of the receipt, in order.
fn layout(receipt: &Receipt) -> Vec<Vec<Operation>> {
  let mut page = PageWriter::new();

  page.text_at("F2", 20, LEFT, "NuEats");
  page.y -= 24;
  page.text_at("F1", 11, LEFT, &format!("Official receipt for Order #{}", receipt.order_id));
  page.y -= LINE_HEIGHT;
  page.text_at(
    "F1",
    11,
    LEFT,
    &format!("Issued {}", receipt.issued_at.format("%Y-%m-%d %H:%M UTC")),
  );
  page.y -= 28;
  page.column_headers();

  for line in &receipt.lines {
    page.ensure_room(LINE_HEIGHT, receipt.order_id);
    page.text_at("F1", 11, LEFT, &line.name);
    page.text_at("F1", 11, QTY_COLUMN, &line.quantity.to_string());
    page.text_at("F1", 11, PRICE_COLUMN, &receipt.money(line.unit_price));
    page.text_at("F1", 11, TOTAL_COLUMN, &receipt.money(line.line_total));
    page.y -= LINE_HEIGHT;
  }

  page.ensure_room(SUMMARY_HEIGHT, receipt.order_id);
  page.rule_at(page.y + 10);
  page.y -= 6;
  let summary = [
    ("Subtotal", receipt.subtotal),
    (receipt.tax_label.as_str(), receipt.tax),
  ];
  for (label, amount) in summary {
    page.text_at("F1", 11, PRICE_COLUMN, label);
    page.text_at("F1", 11, TOTAL_COLUMN, &receipt.money(amount));
    page.y -= LINE_HEIGHT;
  }
  page.text_at("F2", 12, PRICE_COLUMN, "Total");
  page.text_at("F2", 12, TOTAL_COLUMN, &receipt.money(receipt.total));
  page.y -= 40;
  page.text_at("F1", 10, LEFT, "Thank you for ordering with NuEats.");

  page.finish()
}

pub fn render_pdf(receipt: &Receipt) -> AppResult<Vec<u8>> {
  let mut doc = Document::with_version("1.5");
  let pages_id = doc.new_object_id();
  let regular_id = doc.add_object(dictionary! {
    "Type" => "Font",
    "Subtype" => "Type1",
    "BaseFont" => "Helvetica",
  });
  let bold_id = doc.add_object(dictionary! {
    "Type" => "Font",
    "Subtype" => "Type1",
    "BaseFont" => "Helvetica-Bold",
  });
  let resources_id = doc.add_object(dictionary! {
    "Font" => dictionary! {
      "F1" => regular_id,
      "F2" => bold_id,
    },
  });

  let mut kids: Vec<Object> = Vec::new();
  for operations in layout(receipt) {
    let content = Content { operations }
      .encode()
      .map_err(|e| AppError::Receipt(format!("Failed to encode receipt content: {}", e)))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    let page_id = doc.add_object(dictionary! {
      "Type" => "Page",
      "Parent" => pages_id,
      "Contents" => content_id,
    });
    kids.push(page_id.into());
  }

  let page_count = kids.len() as i64;
  let pages = dictionary! {
    "Type" => "Pages",
    "Kids" => kids,
    "Count" => page_count,
    "Resources" => resources_id,
    "MediaBox" => vec![
      Object::Integer(0),
      Object::Integer(0),
      Object::Integer(PAGE_WIDTH),
      Object::Integer(PAGE_HEIGHT),
    ],
  };
  doc.objects.insert(pages_id, Object::Dictionary(pages));
  let catalog_id = doc.add_object(dictionary! {
    "Type" => "Catalog",
    "Pages" => pages_id,
  });
  doc.trailer.set("Root", catalog_id);

  let mut buffer = Vec::new();
  doc
    .save_to(&mut buffer)
    .map_err(|e| AppError::Receipt(format!("Failed to write receipt PDF: {}", e)))?;
  Ok(buffer)
}
