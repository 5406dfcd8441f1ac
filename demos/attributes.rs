//! Example demonstrating attribute mapping, wire names and default suppression.

use xml_model::{entity_type, member, IndentConfig, ModelBuilder, XmlDataSerializer};

/// Product with attributes and child elements.
#[derive(Debug, Clone, PartialEq, Default)]
struct Product {
    id: String,
    sku: String,
    name: String,
    price: f64,
    discontinued: bool,
}

/// Catalog with version attribute and product children.
#[derive(Debug, Clone, PartialEq, Default)]
struct Catalog {
    version: String,
    products: Vec<Product>,
}

entity_type!(Product, Catalog);

fn main() -> xml_model::Result<()> {
    let mut builder = ModelBuilder::new();
    builder
        .has_known_entity::<Product>()
        .has_name("product")
        .property(member!(Product, id))?
        .is_mapped_as_attribute()
        .property(member!(Product, sku))?
        .is_mapped_as_attribute()
        .has_name("SKU")
        .property(member!(Product, name))?
        .property(member!(Product, price))?
        .property(member!(Product, discontinued))?
        .is_mapped_as_attribute()
        .should_not_serialize_if_default();
    builder
        .has_known_entity::<Catalog>()
        .property(member!(Catalog, version))?
        .is_mapped_as_attribute()
        .property(member!(Catalog, products))?
        .has_name("Products");

    let serializer = XmlDataSerializer::new()
        .with_model(builder.build())
        .with_indent(IndentConfig::default())
        .with_declaration(true);

    // ================================
    // DESERIALIZATION
    // ================================
    println!("=== Deserializing XML with Attributes ===\n");

    let xml = r#"
        <Catalog version="1.0">
            <Products>
                <product id="1" SKU="WIDGET-001">
                    <name>Super Widget</name>
                    <price>19.99</price>
                </product>
                <product id="2" SKU="GADGET-002" discontinued="true">
                    <name>Mega Gadget</name>
                    <price>49.5</price>
                </product>
            </Products>
        </Catalog>
    "#;

    let catalog: Catalog = serializer.deserialize_str(xml)?;
    println!("Catalog version: {}", catalog.version);
    for product in &catalog.products {
        println!(
            "  [{}] {} ({}) - ${:.2}{}",
            product.id,
            product.name,
            product.sku,
            product.price,
            if product.discontinued { " (discontinued)" } else { "" }
        );
    }

    // ================================
    // SERIALIZATION
    // ================================
    println!("\n=== Serializing with Attributes ===\n");

    // `discontinued="false"` is left out of the first product
    let xml = serializer.serialize_to_string(&catalog)?;
    println!("{}", xml);

    let back: Catalog = serializer.deserialize_str(&xml)?;
    assert_eq!(back, catalog);
    println!("\nRoundtrip successful!");
    Ok(())
}
