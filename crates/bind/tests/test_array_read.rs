use soapwire_bind::{
    BindError, ExpectedType, ReadValue, Result, TypeInfo, TypeMapper, Value, XmlObject,
};
use soapwire_xml::{QName, XmlReader, XmlWriter, ns};

const NAMESPACE: &str = "urn:objects.soapwire.example";

/// Writes `value` under `<sw:start>` the way a client call frame would and
/// returns the document.
fn serialize_under_wrapper(value: Value, mapper: &TypeMapper) -> Result<String> {
    let qname = QName::new(NAMESPACE, "anArray");
    let object = XmlObject::with_value(qname.clone(), value);

    let mut buffer = Vec::new();
    {
        let mut xout = XmlWriter::new(&mut buffer);
        xout.set_prefix("sw", NAMESPACE);
        xout.set_prefix("xsi", ns::SCHEMA_INSTANCE_NS);
        xout.set_prefix("xsd", ns::SCHEMA_NS);
        xout.start_document()?;
        let wrapper = QName::new(NAMESPACE, "start");
        xout.write_start_tag(&wrapper)?;
        object.write(&qname, &mut xout, mapper)?;
        xout.write_end_tag(&wrapper)?;
        xout.close()?;
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn string_array_info(min_occurs: u32, max_occurs: i32, nillable: bool) -> TypeInfo {
    TypeInfo::new(
        NAMESPACE,
        "anArray",
        ns::SCHEMA_NS,
        "string",
        min_occurs,
        max_occurs,
        nillable,
    )
}

#[test]
fn test_string_array_roundtrip_via_descriptor() -> Result<()> {
    let mapper = TypeMapper::new();
    let original = Value::array(["a", "b"]);
    let xml = serialize_under_wrapper(original.clone(), &mapper)?;
    println!("serialized: {}", xml);

    let info = string_array_info(0, -1, true);
    let mut xin = XmlReader::from_str(&xml);
    xin.next_tag()?;
    let result = mapper.read_object(&mut xin, &info, ExpectedType::Array)?;

    match result {
        ReadValue::Value(value) => {
            assert!(value.is_array());
            assert_eq!(value, original);
        }
        other => panic!("expected an array value, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_scalar_read_via_descriptor() -> Result<()> {
    let mapper = TypeMapper::new();
    let qname = QName::new(NAMESPACE, "count");
    let object = XmlObject::with_value(qname.clone(), 41i32);

    let mut buffer = Vec::new();
    {
        let mut xout = XmlWriter::new(&mut buffer);
        xout.set_prefix("sw", NAMESPACE);
        xout.start_document()?;
        let wrapper = QName::new(NAMESPACE, "start");
        xout.write_start_tag(&wrapper)?;
        object.write(&qname, &mut xout, &mapper)?;
        xout.write_end_tag(&wrapper)?;
        xout.close()?;
    }
    let xml = String::from_utf8_lossy(&buffer).into_owned();

    let info = TypeInfo::new(NAMESPACE, "count", ns::SCHEMA_NS, "int", 1, 1, false);
    let mut xin = XmlReader::from_str(&xml);
    xin.next_tag()?;
    let result = mapper.read_object(&mut xin, &info, ExpectedType::Scalar)?;

    assert_eq!(result, ReadValue::Value(Value::from(41i32)));
    Ok(())
}

#[test]
fn test_absent_optional_element_reads_nil() -> Result<()> {
    let mapper = TypeMapper::new();
    let xml = format!(r#"<sw:start xmlns:sw="{}"></sw:start>"#, NAMESPACE);

    let info = string_array_info(0, 1, true);
    let mut xin = XmlReader::from_str(&xml);
    xin.next_tag()?;
    let result = mapper.read_object(&mut xin, &info, ExpectedType::Scalar)?;

    assert_eq!(result, ReadValue::Nil);
    Ok(())
}

#[test]
fn test_min_occurs_violation() -> Result<()> {
    let mapper = TypeMapper::new();
    let xml = serialize_under_wrapper(Value::array(["a", "b"]), &mapper)?;

    let info = string_array_info(3, -1, true);
    let mut xin = XmlReader::from_str(&xml);
    xin.next_tag()?;
    let err = mapper
        .read_object(&mut xin, &info, ExpectedType::Array)
        .unwrap_err();

    assert!(matches!(err, BindError::OccurrenceViolation { count: 2, .. }));
    Ok(())
}

#[test]
fn test_max_occurs_violation() -> Result<()> {
    let mapper = TypeMapper::new();
    let xml = serialize_under_wrapper(Value::array(["a", "b"]), &mapper)?;

    let info = string_array_info(0, 1, true);
    let mut xin = XmlReader::from_str(&xml);
    xin.next_tag()?;
    let err = mapper
        .read_object(&mut xin, &info, ExpectedType::Array)
        .unwrap_err();

    assert!(matches!(err, BindError::OccurrenceViolation { .. }));
    Ok(())
}

#[test]
fn test_nil_items_need_a_nillable_descriptor() -> Result<()> {
    let mapper = TypeMapper::new();
    let original = Value::Array(vec![Value::from("a"), Value::Null]);
    let xml = serialize_under_wrapper(original.clone(), &mapper)?;
    println!("serialized: {}", xml);

    let info = string_array_info(0, -1, true);
    let mut xin = XmlReader::from_str(&xml);
    xin.next_tag()?;
    let result = mapper.read_object(&mut xin, &info, ExpectedType::Array)?;
    assert_eq!(result, ReadValue::Value(original));

    let strict = string_array_info(0, -1, false);
    let mut xin = XmlReader::from_str(&xml);
    xin.next_tag()?;
    let err = mapper
        .read_object(&mut xin, &strict, ExpectedType::Array)
        .unwrap_err();
    assert!(matches!(err, BindError::UnexpectedElement { .. }));
    Ok(())
}

#[test]
fn test_unknown_descriptor_type_fails() -> Result<()> {
    let mapper = TypeMapper::new();
    let xml = serialize_under_wrapper(Value::array(["a"]), &mapper)?;

    let info = TypeInfo::new(NAMESPACE, "anArray", "urn:other", "mystery", 0, -1, true);
    let mut xin = XmlReader::from_str(&xml);
    xin.next_tag()?;
    let err = mapper
        .read_object(&mut xin, &info, ExpectedType::Array)
        .unwrap_err();

    assert!(err.to_string().contains("unable to find runtime type for"));
    Ok(())
}

#[test]
fn test_compound_elements_read_as_tree() -> Result<()> {
    let mapper = TypeMapper::new();
    let xml = format!(
        concat!(
            r#"<sw:start xmlns:sw="{ns}" xmlns:xsi="{xsi}" xmlns:xsd="{xsd}">"#,
            r#"<sw:record><sw:name xsi:type="xsd:string">Acme</sw:name></sw:record>"#,
            r#"<sw:record><sw:name xsi:type="xsd:string">Globex</sw:name></sw:record>"#,
            r#"</sw:start>"#
        ),
        ns = NAMESPACE,
        xsi = ns::SCHEMA_INSTANCE_NS,
        xsd = ns::SCHEMA_NS,
    );

    let info = TypeInfo::new(NAMESPACE, "record", NAMESPACE, "record", 0, -1, false);
    let mut xin = XmlReader::from_str(&xml);
    xin.next_tag()?;
    let result = mapper.read_object(&mut xin, &info, ExpectedType::Tree)?;

    match result {
        ReadValue::Objects(records) => {
            assert_eq!(records.len(), 2);
            assert_eq!(
                records[0].get_field("name"),
                Some(&Value::from("Acme"))
            );
            assert_eq!(
                records[1].get_field("name"),
                Some(&Value::from("Globex"))
            );
        }
        other => panic!("expected repeated tree nodes, got {:?}", other),
    }
    Ok(())
}
