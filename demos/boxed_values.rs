//! Example demonstrating boxed values whose type is only known at runtime.
//!
//! Each element of a `Vec<Object>` is written under the wire name of its
//! runtime type, and resolved by that name when read back.

use xml_model::{entity_type, member, ModelBuilder, Node, Object, XmlDataSerializer};

#[derive(Debug, Clone, PartialEq, Default)]
struct Coordinate {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Event {
    kind: String,
    payload: Option<Object>,
}

entity_type!(Coordinate, Event);

fn main() -> xml_model::Result<()> {
    let mut builder = ModelBuilder::new();
    builder
        .has_known_entity::<Coordinate>()
        .has_name("Coord")
        .property(member!(Coordinate, lat))?
        .is_mapped_as_attribute()
        .property(member!(Coordinate, lon))?
        .is_mapped_as_attribute();
    builder
        .has_known_entity::<Event>()
        .property(member!(Event, kind))?
        .is_mapped_as_attribute()
        .property(member!(Event, optional payload))?
        .has_name("Data");
    let serializer = XmlDataSerializer::new().with_model(builder.build());

    let values = vec![
        Object::new(1i32),
        Object::new("a".to_string()),
        Object::new(Coordinate { lat: 52.5, lon: 13.4 }),
        Object::new(vec![Object::new(true), Object::new(2.5f64)]),
    ];
    let event = Event {
        kind: "sample".to_string(),
        payload: Some(Object::new(values)),
    };

    let node = serializer.serialize(&event)?;
    println!("{}", node.to_xml_string()?);

    let back: Event = serializer.deserialize(&node)?;
    assert_eq!(back, event);
    println!("Roundtrip successful!");

    // The root type can also be resolved from the node name alone
    let coord = serializer.deserialize_node(&Node::parse(r#"<Coord lat="1.5" lon="2"/>"#)?)?;
    println!("Resolved from wire name: {:?}", coord);
    Ok(())
}
