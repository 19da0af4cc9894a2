use super::{ObjRef, Value};

use quickcheck::Arbitrary;

impl Arbitrary for Value {
    fn arbitrary(gen: &mut quickcheck::Gen) -> Self {
        match gen.choose(&[1, 2, 3, 4]) {
            Some(1) => Value::Nil,
            Some(2) => Value::Bool(bool::arbitrary(gen)),
            Some(3) => Value::Number(f64::arbitrary(gen)),
            _ => Value::Object(ObjRef::from_index(u8::arbitrary(gen) as u32)),
        }
    }
}
