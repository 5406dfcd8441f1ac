//! # xml_model
//!
//! Model-driven mapping between Rust object graphs and XML node trees.
//!
//! Instead of deriving a fixed layout, callers describe their types at
//! runtime with a [`ModelBuilder`]: which members take part, whether each one
//! maps to an attribute or a child element, how it is named on the wire, and
//! how instances are constructed when read back. The resulting
//! [`ModelRegistry`] drives a serializer and deserializer that walk values
//! through lightweight reflection ([`ModelType`], [`Reflect`]).
//!
//! ## Features
//!
//! - Attribute or element mapping per member, with custom wire names
//! - Constructor-based deserialization with named arguments
//! - Default-value suppression
//! - Collection shapes: `Vec`, `VecDeque`, `LinkedList`, [`Stack`], sets,
//!   arrays and shared slices
//! - Boxed values ([`Object`]) that round trip through their runtime type
//! - A plain [`Node`] tree with XML text reading and writing
//!
//! ## Quick Start
//!
//! ```rust
//! use xml_model::{from_str, member, to_string, ModelBuilder};
//!
//! #[derive(Debug, Clone, PartialEq, Default)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! xml_model::entity_type!(Person);
//!
//! let mut builder = ModelBuilder::new();
//! builder
//!     .has_known_entity::<Person>()
//!     .property(member!(Person, name))?
//!     .is_mapped_as_attribute()
//!     .property(member!(Person, age))?;
//! let model = builder.build();
//!
//! let person = Person {
//!     name: "Alice".to_string(),
//!     age: 30,
//! };
//! let xml = to_string(&model, &person)?;
//! assert_eq!(xml, r#"<Person name="Alice"><age>30</age></Person>"#);
//!
//! let parsed: Person = from_str(&model, &xml)?;
//! assert_eq!(parsed, person);
//! # Ok::<(), xml_model::Error>(())
//! ```
//!
//! ## Constructors
//!
//! Types without a usable default are built from arguments read out of the
//! node. Each parameter names the member supplying it.
//!
//! ```rust
//! use xml_model::{from_str, member, ModelBuilder, ModelType};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Account {
//!     id: u64,
//!     owner: String,
//! }
//!
//! impl ModelType for Account {}
//!
//! let mut builder = ModelBuilder::new();
//! builder
//!     .has_known_entity::<Account>()
//!     .property(member!(Account, id))?
//!     .is_mapped_as_attribute()
//!     .property(member!(Account, owner))?
//!     .constructor()
//!     .parameter(0)
//!     .has_associated_property(member!(Account, id))
//!     .parameter(1)
//!     .has_associated_property(member!(Account, owner))
//!     .invokes(|args| {
//!         Ok(Account {
//!             id: args.take(0)?,
//!             owner: args.take(1)?,
//!         })
//!     });
//! let model = builder.build();
//!
//! let account: Account = from_str(&model, r#"<Account id="7"><owner>Bob</owner></Account>"#)?;
//! assert_eq!(account, Account { id: 7, owner: "Bob".to_string() });
//! # Ok::<(), xml_model::Error>(())
//! ```
//!
//! ## Boxed Values
//!
//! ```rust
//! use xml_model::{from_str, to_string, ModelRegistry, Object};
//!
//! let model = ModelRegistry::new();
//! let values = vec![Object::new(1i32), Object::new("a".to_string()), Object::new(3i32)];
//! let xml = to_string(&model, &values)?;
//! assert_eq!(xml, "<Collection><i32>1</i32><String>a</String><i32>3</i32></Collection>");
//!
//! let back: Vec<Object> = from_str(&model, &xml)?;
//! assert_eq!(back, values);
//! # Ok::<(), xml_model::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

pub mod collection;
pub mod convert;
pub mod de;
pub mod error;
pub mod escape;
pub mod model;
pub mod node;
pub mod reader;
pub mod reflect;
pub mod ser;
pub mod serializer;
pub mod writer;

// Re-export main types and functions
pub use collection::{CollectionShape, ShapeKind, Stack};
pub use convert::Scalar;
pub use de::{from_node, from_str, Deserializer};
pub use error::{Error, ErrorKind, Position, Result};
pub use model::{
    Arguments, ConstructorBuilder, EntityBuilder, EntityTypeInfo, Member, MemberAccessor,
    ModelBuilder, ModelRegistry, ParameterBuilder, PropertyBuilder, PropertyTypeInfo,
};
pub use node::{is_valid_xml_name, Attribute, Node};
pub use reflect::{ModelType, Object, Reflect, TypeDescriptor, TypeKind};
pub use ser::{to_node, to_string, Serializer, COLLECTION_NODE_NAME};
pub use serializer::XmlDataSerializer;
pub use writer::{IndentConfig, XmlWriter};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, LinkedList, VecDeque};

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Point {
        x: i32,
        y: i32,
    }

    entity_type!(Point);

    fn point_model() -> ModelBuilder {
        let mut builder = ModelBuilder::new();
        builder
            .has_known_entity::<Point>()
            .property(member!(Point, x))
            .unwrap()
            .has_name("X")
            .is_mapped_as_attribute()
            .property(member!(Point, y))
            .unwrap()
            .has_name("Y");
        builder
    }

    #[test]
    fn test_roundtrip_attribute_and_element() {
        let model = point_model().build();
        let node = to_node(&model, &Point { x: 1, y: 2 }).unwrap();
        assert_eq!(
            node,
            Node::new("Point")
                .with_attribute("X", "1")
                .with_child(Node::new("Y").with_text("2"))
        );
        let back: Point = from_node(&model, &node).unwrap();
        assert_eq!(back, Point { x: 1, y: 2 });
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Bag {
        label: String,
        payload: Option<Object>,
        history: Stack<String>,
        queue: VecDeque<u16>,
        list: LinkedList<char>,
        set: BTreeSet<i64>,
        matrix: Vec<Vec<f64>>,
        fixed: [u8; 2],
        shared: Option<std::sync::Arc<[bool]>>,
    }

    entity_type!(Bag);

    fn bag_model() -> ModelRegistry {
        let mut builder = ModelBuilder::new();
        builder
            .has_known_entity::<Bag>()
            .property(member!(Bag, label))
            .unwrap()
            .is_mapped_as_attribute()
            .property(member!(Bag, optional payload))
            .unwrap()
            .has_name("Items")
            .property(member!(Bag, history))
            .unwrap()
            .property(member!(Bag, queue))
            .unwrap()
            .property(member!(Bag, list))
            .unwrap()
            .property(member!(Bag, set))
            .unwrap()
            .property(member!(Bag, matrix))
            .unwrap()
            .property(member!(Bag, fixed))
            .unwrap()
            .property(member!(Bag, optional shared))
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_roundtrip_collection_shapes() {
        let model = bag_model();
        let mut history = Stack::new();
        history.push("a".to_string());
        history.push("b".to_string());
        history.push("c".to_string());

        let original = Bag {
            label: "bag".to_string(),
            payload: Some(Object::new(vec![
                Object::new(1i32),
                Object::new("a".to_string()),
                Object::new(3i32),
            ])),
            history,
            queue: VecDeque::from(vec![5, 6]),
            list: ['x', 'y'].into_iter().collect(),
            set: [3, 1, 2].into_iter().collect(),
            matrix: vec![vec![1.5, 2.0], vec![], vec![-0.25]],
            fixed: [7, 8],
            shared: Some(std::sync::Arc::from(vec![true, false])),
        };

        let xml = to_string(&model, &original).unwrap();
        let mut parsed: Bag = from_str(&model, &xml).unwrap();

        // the empty inner row is not written
        assert_eq!(parsed.matrix, vec![vec![1.5, 2.0], vec![-0.25]]);
        parsed.matrix.insert(1, Vec::new());
        assert_eq!(parsed, original);

        let mut popped = Vec::new();
        while let Some(top) = parsed.history.pop() {
            popped.push(top);
        }
        assert_eq!(popped, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_boxed_list_wire_format() {
        let model = bag_model();
        let bag = Bag {
            payload: Some(Object::new(vec![
                Object::new(1i32),
                Object::new("a".to_string()),
                Object::new(3i32),
            ])),
            ..Bag::default()
        };
        let node = to_node(&model, &bag).unwrap();
        let items = node.child("Items").unwrap();
        let pairs: Vec<(&str, Option<&str>)> = items
            .children
            .iter()
            .map(|c| (c.name.as_str(), c.text()))
            .collect();
        assert_eq!(
            pairs,
            vec![("i32", Some("1")), ("String", Some("a")), ("i32", Some("3"))]
        );
    }

    #[test]
    fn test_empty_collections_are_omitted() {
        let model = bag_model();
        let node = to_node(&model, &Bag::default()).unwrap();
        let names: Vec<&str> = node.children.iter().map(|c| c.name.as_str()).collect();
        // only the fixed-size array always has elements
        assert_eq!(names, vec!["fixed"]);
        assert_eq!(node.attribute("label"), Some(""));
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Counter {
        name: String,
        count: u32,
        enabled: bool,
        ratio: Option<f32>,
    }

    entity_type!(Counter);

    #[test]
    fn test_default_suppression() {
        let mut builder = ModelBuilder::new();
        builder
            .has_known_entity::<Counter>()
            .property(member!(Counter, name))
            .unwrap()
            .should_not_serialize_if_default()
            .property(member!(Counter, count))
            .unwrap()
            .is_mapped_as_attribute()
            .should_not_serialize_if_default()
            .property(member!(Counter, enabled))
            .unwrap()
            .should_not_serialize_if_default()
            .should_serialize_if_default()
            .property(member!(Counter, ratio))
            .unwrap();
        let model = builder.build();

        let xml = to_string(&model, &Counter::default()).unwrap();
        assert_eq!(xml, "<Counter><enabled>false</enabled></Counter>");

        let counter = Counter {
            name: "hits".to_string(),
            count: 3,
            enabled: true,
            ratio: Some(0.5),
        };
        let xml = to_string(&model, &counter).unwrap();
        assert_eq!(
            xml,
            r#"<Counter count="3"><name>hits</name><enabled>true</enabled><ratio>0.5</ratio></Counter>"#
        );
        assert_eq!(from_str::<Counter>(&model, &xml).unwrap(), counter);
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Ticket {
        id: u64,
        title: String,
        labels: Vec<String>,
        created_by_constructor: bool,
    }

    impl ModelType for Ticket {}

    fn ticket_model(title_set_by_engine: bool) -> ModelRegistry {
        let mut builder = ModelBuilder::new();
        let parameter = builder
            .has_known_entity::<Ticket>()
            .property(member!(Ticket, id))
            .unwrap()
            .is_mapped_as_attribute()
            .property(member!(Ticket, title))
            .unwrap()
            .property(member!(Ticket, readonly labels))
            .unwrap()
            .constructor()
            .parameter(0)
            .has_associated_property(member!(Ticket, id))
            .parameter(1)
            .has_associated_property(member!(Ticket, title));
        let parameter = if title_set_by_engine {
            parameter.value_is_set_by_engine()
        } else {
            parameter.value_is_set_by_constructor()
        };
        parameter.invokes(|args| {
            let title: String = args.take(1)?;
            Ok(Ticket {
                id: args.take(0)?,
                title: title.to_uppercase(),
                labels: vec!["new".to_string()],
                created_by_constructor: true,
            })
        });
        builder.build()
    }

    #[test]
    fn test_constructor_owns_its_members() {
        let model = ticket_model(false);
        let ticket: Ticket = from_str(
            &model,
            r#"<Ticket id="9"><title>crash</title><labels><String>bug</String></labels></Ticket>"#,
        )
        .unwrap();
        assert!(ticket.created_by_constructor);
        assert_eq!(ticket.id, 9);
        assert_eq!(ticket.title, "CRASH");
        // read-only collection refilled in place
        assert_eq!(ticket.labels, vec!["bug"]);
    }

    #[test]
    fn test_engine_assigns_after_constructor() {
        let model = ticket_model(true);
        let ticket: Ticket = from_str(&model, r#"<Ticket id="9"><title>crash</title></Ticket>"#).unwrap();
        assert_eq!(ticket.title, "crash");
        // absent collection keeps the constructor value
        assert_eq!(ticket.labels, vec!["new"]);
    }

    #[test]
    fn test_missing_constructor_member() {
        let model = ticket_model(false);
        let err = from_str::<Ticket>(&model, r#"<Ticket id="9"/>"#).unwrap_err();
        match err.kind() {
            ErrorKind::MissingRequiredMember {
                index,
                property,
                wire_name,
                ..
            } => {
                assert_eq!(*index, 1);
                assert_eq!(property, "title");
                assert_eq!(wire_name, "title");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.to_string().contains("'title' was not found"));
    }

    #[test]
    fn test_sparse_constructor_parameters() {
        let mut builder = ModelBuilder::new();
        builder
            .has_known_entity::<Ticket>()
            .property(member!(Ticket, id))
            .unwrap()
            .constructor()
            .parameter(1)
            .has_associated_property(member!(Ticket, id))
            .invokes(|args| {
                Ok(Ticket {
                    id: args.take(0)?,
                    title: String::new(),
                    labels: Vec::new(),
                    created_by_constructor: true,
                })
            });
        let model = builder.build();
        let err = from_str::<Ticket>(&model, "<Ticket><id>1</id></Ticket>").unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::MissingConstructorParameter { index: 0, .. }
        ));
    }

    #[test]
    fn test_rename_keeps_index_consistent() {
        let mut builder = point_model();
        builder.has_known_entity::<Point>().has_name("Pt").has_name("Vertex");
        let serializer = XmlDataSerializer::new().with_model(builder.build());

        let xml = serializer.serialize_to_string(&Point { x: 3, y: 4 }).unwrap();
        assert_eq!(xml, r#"<Vertex X="3"><Y>4</Y></Vertex>"#);

        let value = serializer.deserialize_node(&Node::parse(&xml).unwrap()).unwrap();
        assert_eq!(value.downcast_ref::<Point>(), Some(&Point { x: 3, y: 4 }));

        for stale in ["Point", "Pt"] {
            let node = Node::new(stale).with_attribute("X", "1");
            let err = serializer.deserialize_node(&node).unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::UnresolvedWireName(_)));
        }
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Base {
        id: u32,
        note: String,
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Derived {
        base: Base,
        extra: String,
    }

    entity_type!(Base, Derived);

    #[test]
    fn test_base_constructor_ownership() {
        let mut builder = ModelBuilder::new();
        builder
            .has_known_entity::<Base>()
            .property(member!(Base, id))
            .unwrap()
            .is_mapped_as_attribute()
            .property(member!(Base, note))
            .unwrap()
            .constructor()
            .parameter(0)
            .has_associated_property(member!(Base, id))
            .invokes(|args| {
                Ok(Base {
                    id: args.take(0)?,
                    note: String::new(),
                })
            });
        builder
            .has_known_entity::<Derived>()
            .property(member!(Derived, "id" => base.id).declared_in::<Base>())
            .unwrap()
            .is_mapped_as_attribute()
            .property(member!(Derived, "note" => base.note).declared_in::<Base>())
            .unwrap()
            .property(member!(Derived, extra))
            .unwrap();
        let model = builder.build();

        let original = Derived {
            base: Base {
                id: 5,
                note: "n".to_string(),
            },
            extra: "e".to_string(),
        };
        let xml = to_string(&model, &original).unwrap();
        assert_eq!(
            xml,
            r#"<Derived id="5"><note>n</note><extra>e</extra></Derived>"#
        );

        let base: Base = from_str(&model, r#"<Base id="5"><note>n</note></Base>"#).unwrap();
        assert_eq!(base, original.base);

        // the id belongs to the base constructor and is left alone here
        let derived: Derived = from_str(&model, &xml).unwrap();
        assert_eq!(derived.base.id, 0);
        assert_eq!(derived.base.note, "n");
        assert_eq!(derived.extra, "e");
    }

    #[test]
    fn test_error_cases() {
        let model = point_model().build();

        let err = from_str::<Point>(&model, r#"<Point X="one"/>"#).unwrap_err();
        assert!(err.is_conversion());

        let err = from_str::<Point>(&model, "<Point><Y>1</Point>").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MismatchedTag { .. }));

        let err = to_string(&model, &Counter::default()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnknownEntity(_)));

        let err = Deserializer::new(&model)
            .deserialize(&Node::new("Unknown").with_child(Node::new("a")), None)
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnresolvedWireName(_)));
    }

    #[test]
    fn test_escaped_text_roundtrip() {
        let model = ModelRegistry::new();
        let original = vec!["<hello> & \"world\"".to_string()];
        let xml = to_string(&model, &original).unwrap();
        let parsed: Vec<String> = from_str(&model, &xml).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_padded_text_roundtrip() {
        let mut builder = ModelBuilder::new();
        builder
            .has_known_entity::<Counter>()
            .property(member!(Counter, name))
            .unwrap()
            .property(member!(Counter, count))
            .unwrap();
        let serializer = XmlDataSerializer::new().with_model(builder.build());
        let counter = Counter {
            name: "  padded ".to_string(),
            count: 2,
            ..Counter::default()
        };

        let xml = serializer.serialize_to_string(&counter).unwrap();
        assert_eq!(xml, "<Counter><name>  padded </name><count>2</count></Counter>");
        assert_eq!(serializer.deserialize_str::<Counter>(&xml).unwrap(), counter);

        let pretty = serializer
            .clone()
            .with_indent(IndentConfig::default())
            .serialize_to_string(&counter)
            .unwrap();
        assert_eq!(serializer.deserialize_str::<Counter>(&pretty).unwrap(), counter);
    }

    #[test]
    fn test_model_shared_between_threads() {
        let serializer = XmlDataSerializer::new().with_model(point_model().build());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let serializer = serializer.clone();
                std::thread::spawn(move || {
                    let xml = serializer.serialize_to_string(&Point { x: i, y: i }).unwrap();
                    serializer.deserialize_str::<Point>(&xml).unwrap()
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let i = i as i32;
            assert_eq!(handle.join().unwrap(), Point { x: i, y: i });
        }
    }
}
