use super::*;

#[test]
fn constructors_carry_their_code() {
    assert_eq!(ApiException::not_found("gone").code, ErrorCode::NotFound);
    assert_eq!(ApiException::validation("bad").code, ErrorCode::Validation);
    assert_eq!(ApiException::conflict("busy").code, ErrorCode::Conflict);
}

#[test]
fn exception_is_recoverable_from_a_boxed_error() {
    let err = boxed(ApiException::conflict("menu has children"));
    let exception = err
        .downcast_ref::<ApiException>()
        .expect("api exception in chain");
    assert_eq!(exception.code, ErrorCode::Conflict);
    assert_eq!(err.to_string(), "Conflict: menu has children");
}

fn boxed(err: ApiException) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(err)
}
