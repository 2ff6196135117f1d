mod common;
use common::{assert_clean, run_pipeline};
use fern::CommentStyle;

static INVENTORY: &str = include_str!("../demos/inventory.fern");

#[test]
fn inventory() {
    let ir = assert_clean(INVENTORY).into_ir().unwrap();

    let restock = ir.globals.function("restock").unwrap();
    assert_eq!(restock.takes, ["list-int", "int"]);
    assert_eq!(restock.returns, ["list-int", "bool"]);

    let item = ir.globals.datatype("Item").unwrap();
    assert_eq!(item.field("tags").unwrap(), "list-string");

    let limit = ir.globals.variable("limit").unwrap();
    assert_eq!(limit.ty, "int");
    assert!(ir.globals.variable("bolt").is_none());
}

#[test]
fn inventory_needs_line_comments() {
    let checked = run_pipeline(INVENTORY, CommentStyle::MarkerRun);
    assert!(!checked.is_clean());
}

#[test]
fn chained_globals() {
    let ir = assert_clean("int a = 1, b = +(a, 1), c = *(b, 2).")
        .into_ir()
        .unwrap();
    let mut names: Vec<_> = ir.globals.variables().map(|v| &*v.name).collect();
    names.sort_unstable();
    assert_eq!(names, ["a", "b", "c"]);
}

#[test]
fn block_forms() {
    assert_clean(
        "fun main() {
           block
             int x = 1.
             { int y = +(x, 1). Stdout::println(String::from_int(y)). }
           end
         }",
    );
}
