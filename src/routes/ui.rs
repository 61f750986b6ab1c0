use axum::{response::Html, routing::get, Router};

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Tabular Chat</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 2rem; color: #1d1d1f; }
    h1 { margin-bottom: 0.5rem; }
    .columns { display: flex; gap: 1rem; align-items: flex-start; }
    .card { border: 1px solid #ddd; padding: 1rem; border-radius: 8px; margin-bottom: 1rem; flex: 1; }
    label { display: block; margin-top: 0.75rem; font-weight: 600; }
    select, textarea, input { width: 100%; padding: 0.5rem; }
    button { margin-top: 1rem; padding: 0.6rem 1rem; }
    .warning { color: #b45309; margin-top: 0.5rem; }
    .error { color: #b91c1c; margin-top: 0.5rem; }
    .turn { border-bottom: 1px solid #eee; padding: 0.5rem 0; }
    .turn .q { font-weight: 600; }
    #chartImg { max-width: 100%; margin-top: 1rem; }
    .hidden { display: none; }
  </style>
</head>
<body>
  <h1>Tabular Chat</h1>
  <p>Upload a CSV or Excel file, chart its columns, and ask questions about the data.</p>

  <div class="card">
    <h2>Upload a CSV or Excel file</h2>
    <input id="fileInput" type="file" accept=".csv,.xlsx" />
    <button id="uploadBtn">Upload</button>
    <div id="uploadStatus"></div>
  </div>

  <div class="columns">
    <div id="chartCard" class="card hidden">
      <h2>Customize Your Graph</h2>
      <label>Graph type</label>
      <span>
        <label><input type="radio" name="kind" value="Bar" checked /> Bar</label>
        <label><input type="radio" name="kind" value="Line" /> Line</label>
        <label><input type="radio" name="kind" value="Scatter" /> Scatter</label>
        <label><input type="radio" name="kind" value="Pie" /> Pie</label>
      </span>
      <label>Choose X-axis</label>
      <select id="xSelect"></select>
      <label>Choose Y-axis (multi-select)</label>
      <select id="ySelect" multiple size="5"></select>
      <div id="chartStatus"></div>
      <img id="chartImg" alt="" />
    </div>

    <div id="chatCard" class="card hidden">
      <h2>Chat with AI</h2>
      <label>What do you want to ask?</label>
      <textarea id="prompt" rows="3"></textarea>
      <button id="askBtn">Ask</button>
      <div id="askStatus"></div>
      <div id="history"></div>
    </div>
  </div>

  <script>
    let sessionId = null;

    const uploadBtn = document.getElementById('uploadBtn');
    const askBtn = document.getElementById('askBtn');
    const uploadStatus = document.getElementById('uploadStatus');
    const chartStatus = document.getElementById('chartStatus');
    const askStatus = document.getElementById('askStatus');
    const chartImg = document.getElementById('chartImg');
    const xSelect = document.getElementById('xSelect');
    const ySelect = document.getElementById('ySelect');

    function fillSelect(select, columns) {
      select.innerHTML = '';
      for (const name of columns) {
        const option = document.createElement('option');
        option.value = name;
        option.textContent = name;
        select.appendChild(option);
      }
    }

    uploadBtn.addEventListener('click', async () => {
      const fileInput = document.getElementById('fileInput');
      if (!fileInput.files.length) {
        uploadStatus.innerHTML = '<div class="warning">Select a file first.</div>';
        return;
      }
      const formData = new FormData();
      formData.append('file', fileInput.files[0]);
      if (sessionId) formData.append('session_id', sessionId);
      uploadStatus.textContent = 'Uploading...';
      const res = await fetch('/api/upload', { method: 'POST', body: formData });
      const json = await res.json();
      if (!res.ok) {
        uploadStatus.innerHTML = '<div class="error">' + json.error + '</div>';
        return;
      }
      sessionId = json.session_id;
      uploadStatus.textContent = 'File uploaded successfully!';
      fillSelect(xSelect, json.columns);
      fillSelect(ySelect, json.columns);
      document.getElementById('chartCard').classList.remove('hidden');
      document.getElementById('chatCard').classList.remove('hidden');
      renderChart();
      renderHistory();
    });

    async function renderChart() {
      if (!sessionId) return;
      const kind = document.querySelector('input[name="kind"]:checked').value;
      const yColumns = Array.from(ySelect.selectedOptions).map(o => o.value);
      const payload = {
        session_id: sessionId,
        kind: kind,
        x_column: xSelect.value,
        y_columns: yColumns
      };
      const res = await fetch('/api/chart', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(payload)
      });
      const json = await res.json();
      if (!res.ok) {
        chartStatus.innerHTML = '<div class="error">' + json.error + '</div>';
        chartImg.removeAttribute('src');
        return;
      }
      if (json.status === 'warning') {
        chartStatus.innerHTML = '<div class="warning">' + json.warning + '</div>';
        chartImg.removeAttribute('src');
        return;
      }
      chartStatus.textContent = '';
      const pngRes = await fetch('/api/chart/png', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(payload)
      });
      if (pngRes.ok && pngRes.headers.get('Content-Type') === 'image/png') {
        chartImg.src = URL.createObjectURL(await pngRes.blob());
      }
    }

    document.querySelectorAll('input[name="kind"]').forEach(r => r.addEventListener('change', renderChart));
    xSelect.addEventListener('change', renderChart);
    ySelect.addEventListener('change', renderChart);

    async function renderHistory() {
      if (!sessionId) return;
      const res = await fetch('/api/history?session_id=' + sessionId);
      if (!res.ok) return;
      const json = await res.json();
      const history = document.getElementById('history');
      history.innerHTML = '';
      for (const turn of json.turns) {
        const div = document.createElement('div');
        div.className = 'turn';
        const q = document.createElement('div');
        q.className = 'q';
        q.textContent = turn.question;
        const a = document.createElement('div');
        a.textContent = turn.response;
        div.appendChild(q);
        div.appendChild(a);
        history.appendChild(div);
      }
    }

    askBtn.addEventListener('click', async () => {
      const prompt = document.getElementById('prompt').value;
      if (!prompt.trim()) {
        askStatus.innerHTML = '<div class="warning">Please enter a question.</div>';
        return;
      }
      askStatus.textContent = 'Generating response...';
      askBtn.disabled = true;
      try {
        const res = await fetch('/api/ask', {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify({ session_id: sessionId, prompt: prompt })
        });
        const json = await res.json();
        if (!res.ok) {
          askStatus.innerHTML = '<div class="error">' + json.error + '</div>';
        } else if (json.status === 'warning') {
          askStatus.innerHTML = '<div class="warning">' + json.warning + '</div>';
        } else {
          askStatus.textContent = '';
          document.getElementById('prompt').value = '';
        }
      } finally {
        askBtn.disabled = false;
      }
      renderHistory();
    });
  </script>
</body>
</html>"#)
}
