//! Example demonstrating constructor-based deserialization.
//!
//! `Invoice` has no sensible default, so the model tells the deserializer
//! which members feed the constructor. Members the constructor owns are not
//! assigned again; `issued_by` is flagged so the engine also sets it after
//! construction.

use xml_model::{from_str, member, to_string, ModelBuilder, ModelType};

#[derive(Debug, Clone, PartialEq)]
struct Invoice {
    number: u64,
    customer: String,
    issued_by: String,
    lines: Vec<String>,
    total_cents: i64,
}

impl ModelType for Invoice {}

impl Invoice {
    fn new(number: u64, customer: String, issued_by: String) -> Self {
        Invoice {
            number,
            customer: customer.trim().to_string(),
            issued_by: format!("{} (pending)", issued_by),
            lines: Vec::new(),
            total_cents: 0,
        }
    }
}

fn main() -> xml_model::Result<()> {
    let mut builder = ModelBuilder::new();
    builder
        .has_known_entity::<Invoice>()
        .property(member!(Invoice, number))?
        .is_mapped_as_attribute()
        .property(member!(Invoice, customer))?
        .property(member!(Invoice, issued_by))?
        .property(member!(Invoice, readonly lines))?
        .property(member!(Invoice, total_cents))?
        .has_name("total")
        .constructor()
        .parameter(0)
        .has_associated_property(member!(Invoice, number))
        .parameter(1)
        .has_associated_property(member!(Invoice, customer))
        .parameter(2)
        .has_associated_property(member!(Invoice, issued_by))
        .value_is_set_by_engine()
        .invokes(|args| Ok(Invoice::new(args.take(0)?, args.take(1)?, args.take(2)?)));
    let model = builder.build();

    let xml = r#"
        <Invoice number="1042">
            <customer>ACME Ltd</customer>
            <issued_by>Jane</issued_by>
            <lines>
                <String>2x Widget</String>
                <String>1x Gadget</String>
            </lines>
            <total>6497</total>
        </Invoice>
    "#;

    let invoice: Invoice = from_str(&model, xml)?;
    println!("Invoice #{} for {}", invoice.number, invoice.customer);
    println!("  Issued by: {}", invoice.issued_by);
    for line in &invoice.lines {
        println!("  - {}", line);
    }
    println!("  Total: {:.2}", invoice.total_cents as f64 / 100.0);

    println!("\nSerialized again:");
    println!("{}", to_string(&model, &invoice)?);

    // A constructor argument that is missing from the input is an error
    match from_str::<Invoice>(&model, r#"<Invoice number="1"><issued_by>x</issued_by></Invoice>"#) {
        Ok(_) => println!("\nunexpected success"),
        Err(err) => println!("\nMissing argument: {}", err),
    }
    Ok(())
}
