mod support;

use sema_binder::{GenerativeTypeClass, MemberSpace, SemanticInfoChain, SymbolId};
use support::{single, ty, value};

/// Declared type of member `member` of the type at `owner`.
fn member_type(chain: &mut SemanticInfoChain, owner: &str, member: &str) -> SymbolId {
    let owner = ty(chain, owner);
    let symbol = chain.find_member(owner, member, MemberSpace::Value).unwrap();
    assert!(symbol.is_some(), "no member {member:?}");
    chain.declared_type_of(symbol).unwrap()
}

#[test]
fn test_wrapped_self_reference_is_infinitely_expanding() {
    let (mut chain, _) = single("interface IList<T> { owner: IList<IList<T>>; }");
    chain.bind_all().unwrap();
    let owner = member_type(&mut chain, "IList", "owner");
    let list = ty(&mut chain, "IList");
    assert_eq!(chain.root_of(owner), list);
    assert_eq!(
        chain.generative_type_classification(owner, list).unwrap(),
        GenerativeTypeClass::InfinitelyExpanding
    );
}

#[test]
fn test_closed_arguments() {
    let (mut chain, _) = single(
        r#"
        interface Box<T> { value: T; }
        var b: Box<string>;
        "#,
    );
    chain.bind_all().unwrap();
    let b = value(&mut chain, "b");
    let reference = chain.declared_type_of(b).unwrap();
    let root = ty(&mut chain, "Box");
    assert_eq!(
        chain.generative_type_classification(reference, root).unwrap(),
        GenerativeTypeClass::Closed
    );
}

#[test]
fn test_plain_self_reference_is_open() {
    let (mut chain, _) = single("interface List<T> { next: List<T>; }");
    chain.bind_all().unwrap();
    let next = member_type(&mut chain, "List", "next");
    let list = ty(&mut chain, "List");
    assert_eq!(next, list);
    assert_eq!(
        chain.generative_type_classification(next, list).unwrap(),
        GenerativeTypeClass::Open
    );
}

#[test]
fn test_permuted_parameters_are_open() {
    let (mut chain, _) = single("interface P<K, V> { flip: P<V, K>; }");
    chain.bind_all().unwrap();
    let flip = member_type(&mut chain, "P", "flip");
    let p = ty(&mut chain, "P");
    assert_eq!(
        chain.generative_type_classification(flip, p).unwrap(),
        GenerativeTypeClass::Open
    );
}

#[test]
fn test_wrapping_without_a_path_back_is_open() {
    let (mut chain, _) = single(
        r#"
        interface Other<T> { x: T; }
        interface Holder<T> { o: Other<Other<T>>; }
        "#,
    );
    chain.bind_all().unwrap();
    let o = member_type(&mut chain, "Holder", "o");
    let holder = ty(&mut chain, "Holder");
    assert_eq!(
        chain.generative_type_classification(o, holder).unwrap(),
        GenerativeTypeClass::Open
    );
}

#[test]
fn test_expansion_through_another_type() {
    let (mut chain, _) = single(
        r#"
        interface A<T> { b: B<T[]>; }
        interface B<U> { a: A<U>; }
        "#,
    );
    chain.bind_all().unwrap();
    let b = member_type(&mut chain, "A", "b");
    let a = ty(&mut chain, "A");
    assert_eq!(
        chain.generative_type_classification(b, a).unwrap(),
        GenerativeTypeClass::InfinitelyExpanding
    );
    // Memoized for the generation.
    assert_eq!(
        chain.generative_type_classification(b, a).unwrap(),
        GenerativeTypeClass::InfinitelyExpanding
    );
}

#[test]
fn test_classification_through_references() {
    let (mut chain, _) = single("interface IList<T> { owner: IList<IList<T>>; }");
    chain.bind_all().unwrap();
    let owner = member_type(&mut chain, "IList", "owner");
    let list = ty(&mut chain, "IList");
    let owner_reference = chain.reference_to(owner).unwrap();
    let list_reference = chain.reference_to(list).unwrap();
    assert_eq!(
        chain.generative_type_classification(owner_reference, list_reference).unwrap(),
        GenerativeTypeClass::InfinitelyExpanding
    );
}

#[test]
fn test_closed_reference_back_to_the_root_is_open() {
    let (mut chain, _) = single(
        r#"
        interface A<T> { b: B<T[]>; }
        interface B<U> { a: A<number>; }
        "#,
    );
    chain.bind_all().unwrap();
    let b = member_type(&mut chain, "A", "b");
    let a = ty(&mut chain, "A");
    assert_eq!(
        chain.generative_type_classification(b, a).unwrap(),
        GenerativeTypeClass::Open
    );
}

#[test]
fn test_wrapping_one_level_down_is_infinitely_expanding() {
    let (mut chain, _) = single(
        r#"
        interface A<T> { b: B<T>; }
        interface B<U> { a: A<U[]>; }
        "#,
    );
    chain.bind_all().unwrap();
    let b = member_type(&mut chain, "A", "b");
    let a = ty(&mut chain, "A");
    assert_eq!(
        chain.generative_type_classification(b, a).unwrap(),
        GenerativeTypeClass::InfinitelyExpanding
    );
}

#[test]
fn test_plain_mutual_references_are_open() {
    let (mut chain, _) = single(
        r#"
        interface A<T> { b: B<T>; }
        interface B<U> { a: A<U>; }
        "#,
    );
    chain.bind_all().unwrap();
    let b = member_type(&mut chain, "A", "b");
    let a = ty(&mut chain, "A");
    assert_eq!(
        chain.generative_type_classification(b, a).unwrap(),
        GenerativeTypeClass::Open
    );
}

#[test]
fn test_expansion_through_a_signature() {
    let (mut chain, _) = single(
        r#"
        interface A<T> { b: B<T>; }
        interface B<U> { next(): A<U[]>; }
        "#,
    );
    chain.bind_all().unwrap();
    let b = member_type(&mut chain, "A", "b");
    let a = ty(&mut chain, "A");
    assert_eq!(
        chain.generative_type_classification(b, a).unwrap(),
        GenerativeTypeClass::InfinitelyExpanding
    );
}
