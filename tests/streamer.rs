mod common;

use agentic_chat::llm::{Message, Role};
use agentic_chat::stream::{ChatRequest, ChatTurn, Mode, StreamChunk, NO_TEXT_REPLY};
use common::{cat_results, streamer, Reply, ScriptedCompletion, StubSearch};

fn turn(query: &str) -> ChatTurn {
    ChatTurn::from_request(ChatRequest {
        messages: vec![Message::user(query)],
        system: None,
    })
    .unwrap()
}

fn content(lines: &[&str]) -> Vec<StreamChunk> {
    lines
        .iter()
        .map(|line| StreamChunk::Content(line.to_string()))
        .collect()
}

#[tokio::test]
async fn agent_answer_is_framed_line_by_line_after_the_placeholder() {
    let llm = ScriptedCompletion::new(vec![Reply::Text("Ответь по пунктам"), Reply::Text("A\nB\nC")]);
    let search = StubSearch::returning(cat_results());

    let (chunks, metadata) = streamer(&llm, &search)
        .stream_response(turn("Расскажи про Rust"))
        .collect()
        .await;

    let mut expected = vec![StreamChunk::Status(Mode::Agent.placeholder().to_string())];
    expected.extend(content(&["A", "B", "C"]));
    assert_eq!(chunks, expected);
    assert!(metadata.is_none());
    assert_eq!(llm.calls().len(), 2);
    assert!(search.queries().is_empty());
}

#[tokio::test]
async fn placeholder_is_queued_before_any_upstream_call() {
    let llm = ScriptedCompletion::new(vec![Reply::Text("Шаг"), Reply::Text("Ответ")]);
    let search = StubSearch::returning(vec![]);

    let mut stream = streamer(&llm, &search).stream_response(turn("Вопрос"));

    assert_eq!(
        stream.next_chunk().await,
        Some(StreamChunk::Status(Mode::Agent.placeholder().to_string()))
    );
}

#[tokio::test]
async fn search_keywords_take_the_direct_path() {
    let llm = ScriptedCompletion::new(vec![Reply::Text("Борщ варят\nоколо двух часов")]);
    let search = StubSearch::returning(cat_results());
    let turn = ChatTurn::from_request(ChatRequest {
        messages: vec![
            Message::user("Привет"),
            Message::assistant("Здравствуйте!"),
            Message::user("Найди рецепт борща"),
        ],
        system: None,
    })
    .unwrap();

    let (chunks, metadata) = streamer(&llm, &search).stream_response(turn).collect().await;

    let mut expected = vec![StreamChunk::Status(Mode::DirectSearch.placeholder().to_string())];
    expected.extend(content(&["Борщ варят", "около двух часов"]));
    assert_eq!(chunks, expected);
    assert_eq!(search.queries(), vec!["Найди рецепт борща"]);

    let metadata = metadata.expect("direct search exposes its results");
    assert_eq!(metadata.query, "Найди рецепт борща");
    assert_eq!(metadata.results, cat_results());

    // One completion only: the planner never runs on this path.
    let calls = llm.calls();
    assert_eq!(calls.len(), 1);
    let messages = &calls[0].messages;
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0], Message::user("Привет"));
    assert_eq!(messages[1], Message::assistant("Здравствуйте!"));
    assert_eq!(messages[2].role, Role::User);
    assert!(messages[2].content.contains("\"Найди рецепт борща\""));
    assert!(messages[2].content.contains("Кошки спят до 16 часов в сутки."));
    assert!(calls[0].system.as_deref().unwrap().contains("поисковым результатам"));
}

#[tokio::test]
async fn caller_system_prompt_overrides_the_direct_search_default() {
    let llm = ScriptedCompletion::new(vec![Reply::Text("ok")]);
    let search = StubSearch::returning(vec![]);
    let turn = ChatTurn::from_request(ChatRequest {
        messages: vec![Message::user("узнай курс евро")],
        system: Some("Отвечай одним словом".to_string()),
    })
    .unwrap();

    streamer(&llm, &search).stream_response(turn).collect().await;

    assert_eq!(llm.calls()[0].system.as_deref(), Some("Отвечай одним словом"));
}

#[tokio::test]
async fn search_failure_becomes_one_error_chunk() {
    let llm = ScriptedCompletion::new(vec![Reply::Text("не должно понадобиться")]);
    let search = StubSearch::failing();

    let (chunks, metadata) = streamer(&llm, &search)
        .stream_response(turn("Найди новости"))
        .collect()
        .await;

    assert_eq!(
        chunks,
        vec![
            StreamChunk::Status(Mode::DirectSearch.placeholder().to_string()),
            StreamChunk::Error(Mode::DirectSearch.apology().to_string()),
        ]
    );
    assert!(metadata.is_none());
    assert!(llm.calls().is_empty());
}

#[tokio::test]
async fn agent_failure_does_not_leak_upstream_detail() {
    let llm = ScriptedCompletion::new(vec![Reply::Fail]);
    let search = StubSearch::returning(vec![]);

    let (chunks, _) = streamer(&llm, &search)
        .stream_response(turn("Объясни квантовую механику"))
        .collect()
        .await;

    assert_eq!(
        chunks,
        vec![
            StreamChunk::Status(Mode::Agent.placeholder().to_string()),
            StreamChunk::Error(Mode::Agent.apology().to_string()),
        ]
    );
    assert!(chunks.iter().all(|c| !c.text().contains("exploded")));
}

#[tokio::test]
async fn direct_answer_without_text_uses_the_fixed_reply() {
    let llm = ScriptedCompletion::new(vec![Reply::NoText]);
    let search = StubSearch::returning(vec![]);

    let (chunks, _) = streamer(&llm, &search)
        .stream_response(turn("поиск отелей"))
        .collect()
        .await;

    assert_eq!(chunks.last(), Some(&StreamChunk::Content(NO_TEXT_REPLY.to_string())));
}

#[tokio::test]
async fn blank_answer_becomes_the_fixed_reply() {
    let llm = ScriptedCompletion::new(vec![Reply::Text("")]);
    let search = StubSearch::returning(cat_results());

    let (chunks, metadata) = streamer(&llm, &search)
        .stream_response(turn("Найди котов"))
        .collect()
        .await;

    assert_eq!(
        chunks,
        vec![
            StreamChunk::Status(Mode::DirectSearch.placeholder().to_string()),
            StreamChunk::Content(NO_TEXT_REPLY.to_string()),
        ]
    );
    assert_eq!(metadata.unwrap().query, "Найди котов");
}

#[tokio::test]
async fn panicking_provider_still_ends_with_the_apology() {
    let llm = ScriptedCompletion::new(vec![Reply::Panic]);
    let search = StubSearch::returning(cat_results());

    let (chunks, _) = streamer(&llm, &search)
        .stream_response(turn("Расскажи о котах"))
        .collect()
        .await;

    assert_eq!(
        chunks,
        vec![
            StreamChunk::Status(Mode::Agent.placeholder().to_string()),
            StreamChunk::Error(Mode::Agent.apology().to_string()),
        ]
    );
}

#[tokio::test]
async fn agent_exposes_its_last_search() {
    let llm = ScriptedCompletion::new(vec![
        Reply::Text("Собрать информацию о породах\nОтветь"),
        Reply::Text("сводка"),
        Reply::Text("Итог"),
    ]);
    let search = StubSearch::returning(cat_results());

    let (chunks, metadata) = streamer(&llm, &search)
        .stream_response(turn("Какие бывают кошки?"))
        .collect()
        .await;

    assert_eq!(chunks.last(), Some(&StreamChunk::Content("Итог".to_string())));
    let metadata = metadata.unwrap();
    assert_eq!(metadata.query, "о породах");
    assert_eq!(metadata.results, cat_results());
}

#[tokio::test]
async fn replaying_a_request_yields_identical_chunks() {
    async fn replay() -> Vec<StreamChunk> {
        let llm = ScriptedCompletion::new(vec![
            Reply::Text("Найди информацию о котах\nОтветь вежливо"),
            Reply::Text("сводка"),
            Reply::Text("Первая строка\nВторая строка"),
        ]);
        let search = StubSearch::returning(cat_results());
        streamer(&llm, &search)
            .stream_response(turn("Расскажи о котах"))
            .collect()
            .await
            .0
    }

    assert_eq!(replay().await, replay().await);
}
