use crate::domain::order::Order;
use crate::error::Result;
use std::io::Write;

/// Writes order records as CSV.
pub struct OrderWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OrderWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_orders(&mut self, orders: Vec<Order>) -> Result<()> {
        for order in orders {
            self.writer.serialize(order)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
