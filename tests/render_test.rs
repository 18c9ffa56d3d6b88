use serde::Serialize;
use std::any::Any;
use std::sync::Arc;
use uliquid::{Context, HostObject, LiquidError, Value, parse};

fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn render(source: &str, ctx: &mut Context) -> String {
    parse(source).unwrap().render(ctx).unwrap()
}

#[test]
fn test_render_variable() {
    init_log();
    let mut ctx = Context::new();
    ctx.set_variable("name", "Bob");
    assert_eq!(render("Hello {{ name }}!", &mut ctx), "Hello Bob!");
}

#[test]
fn test_render_for_loop() {
    let mut ctx = Context::new();
    ctx.set_variable("items", vec![1, 2, 3]);
    assert_eq!(
        render("{% for x in items %}{{ x }},{% endfor %}", &mut ctx),
        "1,2,3,"
    );
}

#[test]
fn test_render_if_else() {
    let tpl = parse("{% if a == b %}yes{% else %}no{% endif %}").unwrap();

    let mut ctx = Context::new();
    ctx.set_variable("a", 1);
    ctx.set_variable("b", 1);
    assert_eq!(tpl.render(&mut ctx).unwrap(), "yes");

    ctx.set_variable("b", 2);
    assert_eq!(tpl.render(&mut ctx).unwrap(), "no");
}

#[test]
fn test_render_elsif_chain() {
    let tpl = parse("{% if n == 1 %}one{% elsif n == 2 %}two{% else %}many{% endif %}").unwrap();
    let mut ctx = Context::new();

    for (n, expected) in [(1, "one"), (2, "two"), (7, "many")] {
        ctx.set_variable("n", n);
        assert_eq!(tpl.render(&mut ctx).unwrap(), expected);
    }
}

#[test]
fn test_render_filter() {
    let tpl = parse("{{ x | upcase }}").unwrap();
    let mut ctx = Context::new();
    ctx.set_variable("x", "ab");

    match tpl.render(&mut ctx) {
        Err(LiquidError::UnknownFilter(name)) => assert_eq!(name, "upcase"),
        other => panic!("Expected unknown filter error, got {:?}", other),
    }

    ctx.add_filter("upcase", |v: &Value, _: &[Value], _: &Context| {
        Ok(Value::Str(v.as_str().unwrap_or_default().to_uppercase()))
    });
    assert_eq!(tpl.render(&mut ctx).unwrap(), "AB");
}

#[test]
fn test_render_filter_chain_with_arguments() {
    let mut ctx = Context::new();
    uliquid::tpl::builtins::register_standard_filters(&mut ctx);
    ctx.set_variable("name", "bob");
    assert_eq!(
        render(r#"{{ name | capitalize | append: "!" | prepend: 'Hi ' }}"#, &mut ctx),
        "Hi Bob!"
    );
    ctx.set_variable("n", 0);
    assert_eq!(render("{{ n | plus: 2 | minus: 10 }}", &mut ctx), "-8");
}

#[test]
fn test_break_stops_loop() {
    let mut ctx = Context::new();
    ctx.set_variable("items", vec![1, 2, 3]);
    let out = render(
        "{% for x in items %}{% if x == 2 %}{% break %}{% endif %}{{ x }}{% endfor %}",
        &mut ctx,
    );
    assert_eq!(out, "1");
}

#[test]
fn test_continue_skips_iteration() {
    let mut ctx = Context::new();
    ctx.set_variable("items", vec![1, 2, 3]);
    let out = render(
        "{% for x in items %}{% if x == 2 %}{% continue %}{% endif %}{{ x }}{% endfor %}",
        &mut ctx,
    );
    assert_eq!(out, "13");
}

#[test]
fn test_break_only_leaves_inner_loop() {
    let mut ctx = Context::new();
    ctx.set_variable("rows", vec![vec![1, 2, 3], vec![4, 5]]);
    let out = render(
        "{% for r in rows %}{% for c in r %}{% if c == 2 %}{% break %}{% endif %}{{ c }}{% endfor %};{% endfor %}",
        &mut ctx,
    );
    assert_eq!(out, "1;45;");
}

#[test]
fn test_unterminated_object_is_fatal() {
    match parse("Hello {{ name") {
        Err(LiquidError::Parse { offset, .. }) => assert_eq!(offset, 6),
        other => panic!("Expected parse error, got {:?}", other),
    }
}

#[test]
fn test_text_round_trip() {
    let source = "plain text with } and { and %} but no tags\nsecond line";
    let mut ctx = Context::new();
    assert_eq!(render(source, &mut ctx), source);
}

#[test]
fn test_render_is_idempotent() {
    let tpl = parse("{% for x in xs %}[{{ x }}]{% endfor %}{{ missing }}").unwrap();
    let mut ctx = Context::new();
    ctx.set_variable("xs", vec!["a", "b"]);

    let first = tpl.render(&mut ctx).unwrap();
    let second = tpl.render(&mut ctx).unwrap();
    assert_eq!(first, "[a][b]");
    assert_eq!(first, second);
}

#[test]
fn test_variables_persist_after_loop() {
    let mut ctx = Context::new();
    ctx.set_variable("items", vec![1, 2, 3]);
    assert_eq!(
        render("{% for x in items %}{% endfor %}{{ x }}", &mut ctx),
        "3"
    );
    assert_eq!(ctx.lookup("x"), Value::Int(3));

    render("{% assign y = \"kept\" %}", &mut ctx);
    assert_eq!(ctx.lookup("y"), Value::Str("kept".to_string()));
}

#[test]
fn test_ordering_on_non_ints_is_false() {
    let mut ctx = Context::new();
    ctx.set_variable("d1", 1.5);
    ctx.set_variable("d2", 2.5);

    let tpl = "{% if \"a\" < \"b\" %}y{% else %}n{% endif %}\
               {% if d1 < d2 %}y{% else %}n{% endif %}\
               {% if 1 < 2 %}y{% else %}n{% endif %}";
    assert_eq!(render(tpl, &mut ctx), "nny");
}

#[test]
fn test_truthiness() {
    let mut ctx = Context::new();
    ctx.set_variable("zero", 0);
    ctx.set_variable("empty", "");
    ctx.set_variable("no", false);
    ctx.set_variable("nothing", Value::Null);

    let tpl = "{% if zero %}a{% endif %}{% if empty %}b{% endif %}\
               {% if no %}c{% endif %}{% if nothing %}d{% endif %}{% if unset %}e{% endif %}";
    assert_eq!(render(tpl, &mut ctx), "ab");
}

#[test]
fn test_precedence() {
    let mut ctx = Context::new();
    assert_eq!(
        render("{% if 1 == 1 and 2 == 3 or true %}y{% else %}n{% endif %}", &mut ctx),
        "y"
    );
    assert_eq!(
        render("{% if true or false and false %}y{% else %}n{% endif %}", &mut ctx),
        "y"
    );
    assert_eq!(
        render("{% if 1 == 2 or 3 == 3 and 4 == 5 %}y{% else %}n{% endif %}", &mut ctx),
        "n"
    );
}

#[test]
fn test_member_and_index_access() {
    #[derive(Serialize)]
    struct User {
        name: String,
        tags: Vec<String>,
    }

    let mut ctx = Context::new();
    ctx.expose(
        "user",
        &User {
            name: "Ann".to_string(),
            tags: vec!["x".to_string(), "y".to_string()],
        },
    )
    .unwrap();

    assert_eq!(
        render(
            "{{ user.name }}:{{ user.tags.size }}:{{ user.tags[1] }}:{{ user[\"name\"] }}:[{{ user.tags[9] }}]",
            &mut ctx
        ),
        "Ann:2:y:Ann:[]"
    );
}

#[test]
fn test_bad_index_type_is_fatal() {
    let mut ctx = Context::new();
    ctx.set_variable("xs", vec![1]);
    let result = parse("{{ xs[true] }}").unwrap().render(&mut ctx);
    assert!(matches!(result, Err(LiquidError::Render(_))));
}

#[test]
fn test_for_over_non_list_is_noop() {
    let mut ctx = Context::new();
    ctx.set_variable("n", 5);
    assert_eq!(render("a{% for x in n %}{{ x }}{% endfor %}b", &mut ctx), "ab");
}

#[test]
fn test_references_and_stringifiers() {
    let shared = Arc::new(Value::Str("target".to_string()));
    let mut ctx = Context::new();
    ctx.set_variable("r", Value::reference(&shared));
    ctx.set_variable("flag", true);

    assert_eq!(render("[{{ flag }}]", &mut ctx), "[]");

    ctx.add_stringifier("bool", |v: &Value, _: &Context| {
        let text = if v.is_truthy() { "on" } else { "off" };
        text.to_string()
    });
    ctx.add_stringifier("ref", |v: &Value, c: &Context| match v {
        Value::Ref(r) => r
            .get()
            .map(|target| uliquid::tpl::stringify(&target, c))
            .unwrap_or_default(),
        _ => String::new(),
    });
    assert_eq!(render("[{{ flag }}][{{ r }}]", &mut ctx), "[on][target]");

    drop(shared);
    assert_eq!(render("[{{ r }}]{% if r %}live{% endif %}", &mut ctx), "[]");
}

struct Counter {
    items: Vec<i64>,
}

impl HostObject for Counter {
    fn type_name(&self) -> &str {
        "Counter"
    }

    fn member(&self, name: &str) -> Option<Value> {
        match name {
            "first" => self.items.first().map(|n| Value::Int(*n)),
            _ => None,
        }
    }

    fn len(&self) -> Option<usize> {
        Some(self.items.len())
    }

    fn equals(&self, other: &dyn HostObject) -> bool {
        other
            .as_any()
            .downcast_ref::<Counter>()
            .is_some_and(|c| c.items == self.items)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn test_host_objects() {
    let mut ctx = Context::new();
    ctx.set_variable("c", Value::host(Counter { items: vec![4, 5] }));
    ctx.set_variable("d", Value::host(Counter { items: vec![4, 5] }));

    assert_eq!(
        render("{{ c.first }}/{{ c.size }}/{{ c.other }}{% if c == d %}!{% endif %}", &mut ctx),
        "4/2/!"
    );
}

#[test]
fn test_bind_json() {
    let mut ctx = Context::new();
    ctx.bind_json(serde_json::json!({
        "site": {"title": "Docs"},
        "pages": [{"name": "a"}, {"name": "b"}]
    }))
    .unwrap();

    assert_eq!(
        render(
            "{{ site.title }}:{% for p in pages %}{{ p.name }}{% endfor %}",
            &mut ctx
        ),
        "Docs:ab"
    );
}

#[test]
fn test_large_list_access_inside_loop() {
    let mut ctx = Context::new();
    ctx.set_variable("xs", (0..10_000).collect::<Vec<i64>>());

    let out = render(
        "{% for i in xs %}{% if xs.size == 10000 and xs[i] == i %}.{% endif %}{% endfor %}",
        &mut ctx,
    );
    assert_eq!(out.len(), 10_000);
    assert!(out.chars().all(|c| c == '.'));
}

#[test]
fn test_fresh_contexts_render_alike() {
    let tpl = parse("{% for x in xs %}{% if x > 1 %}{{ x }}{% endif %}{% endfor %}{{ x }}").unwrap();
    let bind = || {
        let mut ctx = Context::new();
        ctx.set_variable("xs", vec![1, 2]);
        ctx
    };

    let first = tpl.render(&mut bind()).unwrap();
    let second = tpl.render(&mut bind()).unwrap();
    assert_eq!(first, "22");
    assert_eq!(first, second);
}

#[test]
fn test_deeply_nested_blocks_render() {
    let depth = 100;
    let source = [
        "{% for x in xs %}".repeat(depth),
        "{{ x }}".to_string(),
        "{% endfor %}".repeat(depth),
    ]
    .concat();

    let mut ctx = Context::new();
    ctx.set_variable("xs", vec![7]);
    assert_eq!(render(&source, &mut ctx), "7");
}
