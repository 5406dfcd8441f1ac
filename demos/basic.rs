//! Basic example demonstrating model configuration and a round trip.

use xml_model::{entity_type, from_str, member, to_string, ModelBuilder};

#[derive(Debug, Clone, PartialEq, Default)]
struct Person {
    name: String,
    age: u32,
    email: String,
}

entity_type!(Person);

fn main() -> xml_model::Result<()> {
    // Describe which members take part
    let mut builder = ModelBuilder::new();
    builder
        .has_known_entity::<Person>()
        .property(member!(Person, name))?
        .property(member!(Person, age))?
        .property(member!(Person, email))?;
    let model = builder.build();

    let person = Person {
        name: "Alice Smith".to_string(),
        age: 30,
        email: "alice@example.com".to_string(),
    };

    // Serialize to XML
    let xml = to_string(&model, &person)?;
    println!("Serialized XML:");
    println!("{}", xml);
    println!();

    // Deserialize from XML
    let xml_input = r#"
        <Person>
            <name>Bob Johnson</name>
            <age>25</age>
            <email>bob@example.com</email>
        </Person>
    "#;

    let parsed: Person = from_str(&model, xml_input)?;
    println!("Deserialized person:");
    println!("  Name: {}", parsed.name);
    println!("  Age: {}", parsed.age);
    println!("  Email: {}", parsed.email);
    println!();

    // Roundtrip
    let roundtrip_xml = to_string(&model, &parsed)?;
    let roundtrip: Person = from_str(&model, &roundtrip_xml)?;
    assert_eq!(parsed, roundtrip);
    println!("Roundtrip successful!");
    Ok(())
}
